// Reading and writing files in the BLT format.

use std::collections::HashMap;
use std::io::Write;
use std::iter::Peekable;
use std::str::Chars;

use crate::tally::*;

#[derive(Eq, PartialEq, Debug, Clone)]
enum Token {
    Number(i64),
    Word(String),
    Quoted(String),
}

struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    lineno: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(contents: &'a str) -> Tokenizer<'a> {
        Tokenizer {
            chars: contents.chars().peekable(),
            lineno: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.lineno += 1;
        }
        c
    }

    // Skips the whitespaces, the byte order marks and the comments.
    fn skip_blanks(&mut self) -> BMwResult<()> {
        loop {
            match self.chars.peek().cloned() {
                Some(c) if c.is_whitespace() || c == '\u{FEFF}' => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.chars.peek() {
                        if *c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if lookahead.next() != Some('*') {
                        return Ok(());
                    }
                    let start = self.lineno;
                    self.bump();
                    self.bump();
                    let mut prev = ' ';
                    loop {
                        match self.bump() {
                            Some('/') if prev == '*' => break,
                            Some(c) => prev = c,
                            None => {
                                return Err(Box::new(MwError::BltSyntax {
                                    lineno: start,
                                    message: "unterminated comment".to_string(),
                                }));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn quoted(&mut self) -> BMwResult<String> {
        let start = self.lineno;
        // Opening quote
        self.bump();
        let mut s = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(s),
                Some('\\') => match self.bump() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(c) => s.push(c),
                    None => break,
                },
                Some('\n') | None => break,
                Some(c) => s.push(c),
            }
        }
        Err(Box::new(MwError::BltSyntax {
            lineno: start,
            message: format!("unterminated string {:?}", s),
        }))
    }

    fn next_token(&mut self) -> BMwResult<Option<(Token, usize)>> {
        self.skip_blanks()?;
        let lineno = self.lineno;
        match self.chars.peek() {
            None => Ok(None),
            Some('"') => Ok(Some((Token::Quoted(self.quoted()?), lineno))),
            Some(_) => {
                let mut s = String::new();
                while let Some(c) = self.chars.peek().cloned() {
                    if c.is_whitespace() || c == '"' || c == '#' || c == '\u{FEFF}' {
                        break;
                    }
                    s.push(c);
                    self.bump();
                }
                let tok = match s.parse::<i64>() {
                    Ok(n) => Token::Number(n),
                    Err(_) => Token::Word(s),
                };
                Ok(Some((tok, lineno)))
            }
        }
    }
}

fn tokenize(contents: &str) -> BMwResult<Vec<(Token, usize)>> {
    let mut tokenizer = Tokenizer::new(contents);
    let mut res: Vec<(Token, usize)> = Vec::new();
    while let Some(t) = tokenizer.next_token()? {
        res.push(t);
    }
    Ok(res)
}

struct BltParser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl BltParser {
    fn lineno(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(_, l)| *l)
            .unwrap_or(1)
    }

    fn number(&mut self, what: &str) -> BMwResult<i64> {
        let lineno = self.lineno();
        match self.tokens.get(self.pos) {
            Some((Token::Number(n), _)) => {
                self.pos += 1;
                Ok(*n)
            }
            Some((t, _)) => Err(Box::new(MwError::BltSyntax {
                lineno,
                message: format!("expected {}, found {:?}", what, t),
            })),
            None => Err(Box::new(MwError::BltSyntax {
                lineno,
                message: format!("expected {}, found the end of the file", what),
            })),
        }
    }

    fn string(&mut self) -> Option<String> {
        let s = match self.tokens.get(self.pos) {
            Some((Token::Quoted(s), _)) | Some((Token::Word(s), _)) => s.clone(),
            _ => return None,
        };
        self.pos += 1;
        Some(s)
    }
}

/// Parses the content of a BLT file.
pub fn parse_blt(contents: &str) -> BMwResult<ParsedElection> {
    let mut p = BltParser {
        tokens: tokenize(contents)?,
        pos: 0,
    };

    let lineno = p.lineno();
    let candidate_count = p.number("the number of candidates")?;
    if candidate_count < 1 || candidate_count > i32::MAX as i64 {
        return Err(Box::new(MwError::BltSyntax {
            lineno,
            message: format!("invalid number of candidates {}", candidate_count),
        }));
    }
    let lineno = p.lineno();
    let seat_count = p.number("the number of seats")?;
    let seat_count = u32::try_from(seat_count).ok().context(BltSyntaxSnafu {
        lineno,
        message: format!("invalid number of seats {}", seat_count),
    })?;

    let check_index = |idx: i64, lineno: usize| -> BMwResult<i32> {
        if idx >= 1 && idx <= candidate_count {
            Ok(idx as i32)
        } else {
            Err(Box::new(MwError::BltSyntax {
                lineno,
                message: format!("unknown candidate {}", idx),
            }))
        }
    };

    let mut withdrawn: HashSet<i32> = HashSet::new();
    let mut lineno = p.lineno();
    let mut tok = p.number("a ballot weight")?;
    while tok < 0 {
        let idx = tok.checked_neg().context(BltSyntaxSnafu {
            lineno,
            message: format!("unknown candidate {}", tok),
        })?;
        withdrawn.insert(check_index(idx, lineno)?);
        lineno = p.lineno();
        tok = p.number("a ballot weight")?;
    }
    debug!("parse_blt: withdrawn candidates: {:?}", withdrawn);

    let withdrawn_ids: std::collections::HashSet<CandidateId> =
        withdrawn.iter().map(|idx| CandidateId(*idx)).collect();
    let mut ballots: Vec<RankedBallot> = Vec::new();
    // A weight of zero ends the ballots.
    while tok != 0 {
        let weight = u64::try_from(tok).ok().context(BltSyntaxSnafu {
            lineno,
            message: format!("invalid ballot weight {}", tok),
        })?;
        let mut ranking: Vec<CandidateId> = Vec::new();
        loop {
            let lineno = p.lineno();
            let idx = p.number("a candidate or 0")?;
            if idx == 0 {
                break;
            }
            ranking.push(CandidateId(check_index(idx, lineno)?));
        }
        ballots.push(
            RankedBallot::new(ranking)
                .with_weight(weight)
                .without(&withdrawn_ids),
        );
        lineno = p.lineno();
        tok = p.number("a ballot weight or 0")?;
    }

    let mut candidates: Vec<(i32, String)> = Vec::new();
    for idx in 1..=(candidate_count as i32) {
        let lineno = p.lineno();
        let name = p.string().context(BltSyntaxSnafu {
            lineno,
            message: format!("missing the name of candidate {}", idx),
        })?;
        if !withdrawn.contains(&idx) {
            candidates.push((idx, name));
        }
    }
    let title = p.string();
    if p.pos < p.tokens.len() {
        warn!(
            "parse_blt: ignoring {} tokens after the title",
            p.tokens.len() - p.pos
        );
    }

    let ballots = aggregate_ranked(&ballots);
    info!(
        "parse_blt: {:?}: {} candidates, {} seats, {} distinct ballots",
        title,
        candidates.len(),
        seat_count,
        ballots.len()
    );
    Ok(ParsedElection {
        title,
        candidates,
        withdrawn,
        seat_count: Some(seat_count),
        ballots: ParsedBallots::Ranked(ballots),
    })
}

pub fn read_blt(path: &str) -> BMwResult<ParsedElection> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    parse_blt(&contents)
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Writes ranked ballots in the BLT format. The candidates are renumbered
/// from 1 in the order of their indexes.
pub fn write_blt<W: Write>(
    w: &mut W,
    ctx: &ElectionContext,
    seat_count: u32,
    ballots: &[RankedBallot],
    title: &str,
) -> std::io::Result<()> {
    let ids = ctx.ids();
    let positions: HashMap<CandidateId, usize> = ids
        .iter()
        .enumerate()
        .map(|(pos, cid)| (*cid, pos + 1))
        .collect();
    writeln!(w, "{} {}", ids.len(), seat_count)?;
    for b in ballots.iter() {
        write!(w, "{}", b.weight())?;
        for cid in b.ranking().iter() {
            if let Some(pos) = positions.get(cid) {
                write!(w, " {}", pos)?;
            }
        }
        writeln!(w, " 0")?;
    }
    writeln!(w, "0")?;
    for cid in ids.iter() {
        writeln!(w, "{}", quote(&ctx.name(*cid)))?;
    }
    writeln!(w, "{}", quote(title))?;
    debug!("write_blt: {} ballots written", ballots.len());
    Ok(())
}
