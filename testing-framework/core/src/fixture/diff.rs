use std::fmt;

use serde_json::Value;

/// One position where the stored and observed event sequences disagree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordDiff {
    pub index: usize,
    /// `None` when the observed run produced extra events.
    pub expected: Option<Value>,
    /// `None` when the observed run produced fewer events.
    pub actual: Option<Value>,
}

/// Order-sensitive, record-level comparison of two event sequences.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Comparison {
    expected_len: usize,
    actual_len: usize,
    diffs: Vec<RecordDiff>,
}

impl Comparison {
    /// Records are compared by their serialized form, so values that are
    /// equal as JSON but encode differently (`-0.0` and `0.0`) still differ.
    #[must_use]
    pub fn between(expected: &[Value], actual: &[Value]) -> Self {
        let len = expected.len().max(actual.len());
        let diffs = (0..len)
            .filter_map(|index| {
                let want = expected.get(index);
                let got = actual.get(index);
                (want.map(Value::to_string) != got.map(Value::to_string)).then(|| RecordDiff {
                    index,
                    expected: want.cloned(),
                    actual: got.cloned(),
                })
            })
            .collect();

        Self {
            expected_len: expected.len(),
            actual_len: actual.len(),
            diffs,
        }
    }

    pub(crate) const fn identical(len: usize) -> Self {
        Self {
            expected_len: len,
            actual_len: len,
            diffs: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_equal(&self) -> bool {
        self.diffs.is_empty()
    }

    #[must_use]
    pub fn diffs(&self) -> &[RecordDiff] {
        &self.diffs
    }
}

fn render(value: Option<&Value>) -> String {
    value.map_or_else(|| "<none>".to_owned(), Value::to_string)
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} of {} expected record(s) differ ({} observed)",
            self.diffs.len(),
            self.expected_len,
            self.actual_len
        )?;
        for diff in &self.diffs {
            writeln!(f, "record {}:", diff.index)?;
            writeln!(f, "- {}", render(diff.expected.as_ref()))?;
            writeln!(f, "+ {}", render(diff.actual.as_ref()))?;
        }
        Ok(())
    }
}
