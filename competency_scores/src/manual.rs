/*!

This is the long-form manual for `competency_scores` and `radarfb`.

## Input

The input is a 360-degree feedback survey export as produced by Google Forms or
Microsoft Forms: one row per submitted form, one column per question. The
command line tool reads Excel files (`.xlsx`, `.xls`) and delimited text
(`.csv`, separated by `;` or `,`). Delimited files must be UTF-8; a file in
another encoding is rejected instead of being read with replacement characters.

Three kinds of columns matter:

* the **reviewer** column, who filled in the form (default phrasings:
  `Wie ben jij?`, `Reviewer`, `Beoordelaar`, `Who are you?`, `Your name`)
* the **subject** column, who the form is about (default phrasings:
  `Voor welke collega vul je dit formulier in?`, `Subject`, `Persoon`,
  `Colleague`, `Which colleague is this feedback for?`)
* the **competency** columns, one per Likert question.

Headers are compared after lowercasing and dropping punctuation, and the usual
damage done by exports that read UTF-8 as Windows-1252 (`Donâ€™t`, `efficiÃ«nt`)
is repaired first.

A competency header looks like this:

```text
🔹 **PROBLEEMANALYSE - Laat deze collega zien een goede probleemanalyse uit te kunnen voeren?** [Herkent de onderliggende oorzaken van problemen]
```

The category is the text between the `**` markers, up to the ` - ` separator
(`PROBLEEMANALYSE`). The bracketed part is the sub-question. When no header in
the file carries markers, every column whose values are all known answers is
taken as a competency column named after its header.

Every other column (timestamps, e-mail addresses, remarks) is ignored.

## Answers

The default scale has four levels:

| answer | score |
|---|---|
| very often / zeer vaak | 4 |
| often / vaak | 3 |
| sometimes / soms | 2 |
| rarely / zelden | 1 |

The five-level scale adds `never` / `nooit` as 1 and shifts the others up.
Blank cells and answers such as `Weet ik niet`, `Don't know`, `N/A` mean "no
opinion": they are kept in the records but never scored. A cell holding only
punctuation, such as `-` or `?`, is not blank. Any other answer
stops the run with an error naming the answer and the column, so that a
renamed scale is not mistaken for missing answers.

## Scores

For each subject and category:

* `mean`: mean of the scores, two decimals
* `count`: number of scored answers
* `std_dev`: sample standard deviation, absent below two answers
* `by_relationship`: the same mean and count for `self` and `peer` answers.
  A reviewer whose name contains the subject's name (or the reverse) is
  assumed to be rating themselves.

Categories that are really one competency split over several question groups
are merged: either because they are listed together in the configuration, or
because several of them contain the same merge keyword (by default
`KLANTGERICHTHEID`). The merged mean is the plain mean of the group means.

The team average of a category is the mean of the subjects' means, so a
subject with many reviewers does not weigh more than one with few.

## Rules file

`radarfb --config rules.json` reads these optional settings:

```json
{
  "reviewerHeaders": ["Wie ben jij?"],
  "subjectHeaders": ["Voor welke collega vul je dit formulier in?"],
  "minCompetencyColumns": 5,
  "scale": "five",
  "noOpinion": ["Weet ik niet"],
  "categoryAliases": { "COMMUNICATIE": ["Luisteren", "Presenteren"] },
  "mergeKeywords": ["KLANTGERICHTHEID"]
}
```

`scale` is `"four"`, `"five"` or a list of levels, most frequent first, each
level being a list of spellings.
*/
