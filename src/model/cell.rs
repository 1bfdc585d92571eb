// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier assigned by the document service.
///
/// Never exposed through the tool protocol; callers address cells by position
/// only, and positions are re-resolved at every point of use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(u64);

impl CellId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell:{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    Code,
    Markdown,
}

impl CellType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Markdown => "markdown",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One Jupyter output record as stored in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputRecord {
    Stream {
        name: String,
        text: String,
    },
    ExecuteResult {
        data: BTreeMap<String, String>,
    },
    DisplayData {
        data: BTreeMap<String, String>,
    },
    Error {
        ename: String,
        evalue: String,
        traceback: Vec<String>,
    },
}

impl OutputRecord {
    pub fn stream(text: impl Into<String>) -> Self {
        Self::Stream { name: "stdout".to_owned(), text: text.into() }
    }

    pub fn execute_result_plain(text: impl Into<String>) -> Self {
        let mut data = BTreeMap::new();
        data.insert("text/plain".to_owned(), text.into());
        Self::ExecuteResult { data }
    }

    /// Readable text for one output record.
    ///
    /// Rich mime bundles collapse to a placeholder when no `text/plain`
    /// representation exists; error tracebacks are joined with ANSI escape
    /// sequences stripped.
    pub fn text(&self) -> String {
        match self {
            Self::Stream { text, .. } => text.clone(),
            Self::ExecuteResult { data } => mime_bundle_text("execute_result", data),
            Self::DisplayData { data } => mime_bundle_text("display_data", data),
            Self::Error { traceback, ename, evalue } => {
                if traceback.is_empty() {
                    format!("{ename}: {evalue}")
                } else {
                    traceback
                        .iter()
                        .map(|line| strip_ansi(line))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
        }
    }
}

/// A positional view of one cell, valid only at the instant it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSnapshot {
    pub cell_id: CellId,
    pub cell_type: CellType,
    pub source: String,
    pub outputs: Vec<OutputRecord>,
    pub execution_count: Option<u64>,
}

impl CellSnapshot {
    pub fn is_code(&self) -> bool {
        matches!(self.cell_type, CellType::Code)
    }

    /// Concatenated readable text of all outputs, trailing whitespace trimmed.
    pub fn output_text(&self) -> String {
        let mut joined = String::new();
        for output in &self.outputs {
            let text = output.text();
            if !joined.is_empty() && !joined.ends_with('\n') {
                joined.push('\n');
            }
            joined.push_str(&text);
        }
        joined.trim_end().to_owned()
    }
}

fn mime_bundle_text(output_type: &str, data: &BTreeMap<String, String>) -> String {
    if let Some(plain) = data.get("text/plain") {
        plain.clone()
    } else if data.contains_key("text/html") {
        "[HTML Output]".to_owned()
    } else if data.contains_key("image/png") {
        "[Image Output (PNG)]".to_owned()
    } else {
        let keys = data.keys().cloned().collect::<Vec<_>>().join(", ");
        format!("[{output_type} Data: keys={keys}]")
    }
}

/// Remove ANSI CSI escape sequences (kernel tracebacks color their frames).
fn strip_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\u{1b}' {
            out.push(ch);
            continue;
        }
        if chars.peek() == Some(&'[') {
            chars.next();
            // CSI parameters end at the first byte in 0x40..=0x7e.
            for terminator in chars.by_ref() {
                if ('\u{40}'..='\u{7e}').contains(&terminator) {
                    break;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{strip_ansi, CellId, CellSnapshot, CellType, OutputRecord};

    fn snapshot_with_outputs(outputs: Vec<OutputRecord>) -> CellSnapshot {
        CellSnapshot {
            cell_id: CellId::new(1),
            cell_type: CellType::Code,
            source: "print('hi')".to_owned(),
            outputs,
            execution_count: Some(1),
        }
    }

    #[test]
    fn stream_output_passes_text_through() {
        let record = OutputRecord::stream("hello\n");
        assert_eq!(record.text(), "hello\n");
    }

    #[test]
    fn execute_result_prefers_text_plain() {
        let mut data = BTreeMap::new();
        data.insert("text/plain".to_owned(), "42".to_owned());
        data.insert("text/html".to_owned(), "<b>42</b>".to_owned());
        assert_eq!(OutputRecord::ExecuteResult { data }.text(), "42");
    }

    #[test]
    fn display_data_without_plain_falls_back_to_placeholders() {
        let mut html = BTreeMap::new();
        html.insert("text/html".to_owned(), "<table/>".to_owned());
        assert_eq!(OutputRecord::DisplayData { data: html }.text(), "[HTML Output]");

        let mut png = BTreeMap::new();
        png.insert("image/png".to_owned(), "iVBOR...".to_owned());
        assert_eq!(OutputRecord::DisplayData { data: png }.text(), "[Image Output (PNG)]");

        let mut other = BTreeMap::new();
        other.insert("application/json".to_owned(), "{}".to_owned());
        assert_eq!(
            OutputRecord::DisplayData { data: other.clone() }.text(),
            "[display_data Data: keys=application/json]"
        );
        assert_eq!(
            OutputRecord::ExecuteResult { data: other }.text(),
            "[execute_result Data: keys=application/json]"
        );
    }

    #[test]
    fn error_output_joins_traceback_without_ansi() {
        let record = OutputRecord::Error {
            ename: "ValueError".to_owned(),
            evalue: "bad".to_owned(),
            traceback: vec![
                "\u{1b}[0;31mValueError\u{1b}[0m".to_owned(),
                "bad".to_owned(),
            ],
        };
        assert_eq!(record.text(), "ValueError\nbad");
    }

    #[test]
    fn error_output_without_traceback_uses_name_and_value() {
        let record = OutputRecord::Error {
            ename: "KeyboardInterrupt".to_owned(),
            evalue: String::new(),
            traceback: Vec::new(),
        };
        assert_eq!(record.text(), "KeyboardInterrupt: ");
    }

    #[test]
    fn output_text_joins_records_with_newlines() {
        let snapshot = snapshot_with_outputs(vec![
            OutputRecord::stream("line one\n"),
            OutputRecord::stream("line two"),
            OutputRecord::execute_result_plain("42"),
        ]);
        assert_eq!(snapshot.output_text(), "line one\nline two\n42");
    }

    #[test]
    fn output_text_of_empty_outputs_is_empty() {
        assert_eq!(snapshot_with_outputs(Vec::new()).output_text(), "");
    }

    #[test]
    fn strip_ansi_keeps_plain_text() {
        assert_eq!(strip_ansi("no escapes here"), "no escapes here");
    }
}
