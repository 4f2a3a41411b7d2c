/*!

This is the long-form manual for `multiwinner_voting` and `mwtally`.

## Counting methods

Every election is tallied with all the methods below. The approval methods
work on approval ballots and STV works on ranked ballots. When an input only
carries one kind of ballot, the other kind is simulated (see below).

* **Approval voting (AV)**: one point for every approved candidate.
* **Net approval voting**: on every non-blank ballot, one point for every
  approved candidate and minus one point for every other candidate.
* **Satisfaction approval voting (SAV)**: a ballot approving `k` candidates
  gives `1/k` to each of them.
* **Sequential proportional approval voting (SPAV)**: candidates are selected
  round by round. In every round a ballot gives `1/(1+m)` to each candidate it
  approves, where `m` is the number of already selected candidates it also
  approves. The candidates with the highest score are selected together.
* **Proportional approval voting (PAV)**: every slate of `seatCount`
  candidates is scored. A ballot approving `k` members of a slate gives it
  `1 + 1/2 + ... + 1/k`. The number of slates grows very quickly with the
  number of candidates and seats: 30 candidates and 5 seats already make
  142506 slates.
* **Single transferable vote (STV)**: the Hagenbach-Bischoff quota
  `ballots / (seats + 1)` with the Wright system. A candidate is seated when
  their total is strictly above the quota. The surplus of a seated candidate
  and all the votes of an eliminated candidate go to the next usable choices of
  the ballots that rank them, in proportion of the number of such ballots.

## Simulated ballots

* From ranked ballots, every voter approves their first `seatCount` choices.
* From approval ballots, every voter ranks the approved candidates by approval
  count, then by name.

## Input formats

The following formats are supported:
* `blt` ranked ballots in the BLT format
* `csv` approval ballots as a matrix of cells
* `surveymonkey` ranked ballots exported by SurveyMonkey as CSV
* `xlsx` approval ballots as a matrix of cells in an Excel workbook

When the input type is not given, it is inferred from the extension of the
file: `.blt` is read as `blt`, `.xlsx` as `xlsx` and everything else as `csv`.

### `blt`

The format first described by Hill, Wichmann and Woodall. Example:

```text
4 2          # 4 candidates, 2 seats
-3           # candidate 3 is withdrawn
3 1 2 0      # 3 ballots ranking candidate 1, then candidate 2
1 4 1 2 0
2 2 0
0            # end of the ballots
"Alice"
"Bob"
"Charlie"
"Dana"
"Board election 2019"
```

Notes:
- comments start with `#` or are enclosed in `/* */`
- a withdrawn candidate is removed from all the ballots and is not registered
- identical ballots are merged
- candidates are numbered from 1

### `csv`

The first row holds the names of the candidates. Every following row is a
ballot: any non-empty cell approves the candidate of its column. Candidates are
numbered from 0.

```text
Alice,Bob,Charlie
x,,x
,x,
```

### `surveymonkey`

The ranking questions exported by SurveyMonkey. The first row holds the names
of the candidates and every cell holds the rank given to this candidate: a
lower number is a higher preference. Empty cells are not ranked. Candidates are
numbered from 1.

### `xlsx`

The same matrix as `csv`, read from the first worksheet of an Excel workbook,
or from the worksheet given with `--excel-worksheet-name`.

## Configuration file

Instead of passing all the options on the command line, they can be gathered
in a JSON file passed with `--config`. The paths are relative to the directory
of the configuration file. The command line options take precedence.

```json
{
  "outputSettings": {
    "contestName": "Board election 2019",
    "outputDirectory": "output"
  },
  "source": {
    "provider": "blt",
    "filePath": "board.blt"
  },
  "rules": {
    "seatCount": 2,
    "maxProportionalSlates": 10
  }
}
```

## Summary

With `--out`, a JSON summary of all the counts is written to a file, or to the
standard output with `--out stdout`. A previous summary can be passed with
`--reference`: the program prints the differences and fails if the new summary
does not match.
*/
