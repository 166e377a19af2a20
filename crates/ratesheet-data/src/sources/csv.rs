//! CSV data source.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use ratesheet_model::RawWorksheet;
use tracing::debug;

use crate::error::{DataError, Result};
use crate::sources::DataSource;

/// Candidate delimiters, in tie-break order
const DELIMITERS: &[u8] = b",;\t";

/// Lines inspected when sniffing the delimiter
const SNIFF_LINES: usize = 10;

/// Options for CSV parsing
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter; sniffed from the file when unset
    pub delimiter: Option<u8>,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Whether to trim whitespace from fields
    pub trim: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: b'"',
            trim: true,
        }
    }
}

impl CsvOptions {
    /// Create options for tab-separated values (TSV)
    pub fn tsv() -> Self {
        Self {
            delimiter: Some(b'\t'),
            ..Default::default()
        }
    }

    /// Create options for semicolon-separated values (common in European locales)
    pub fn semicolon() -> Self {
        Self {
            delimiter: Some(b';'),
            ..Default::default()
        }
    }
}

/// CSV file data source
///
/// A CSV file is a single sheet named after the file stem.
pub struct CsvSource {
    path: PathBuf,
    options: CsvOptions,
    sheet_name: String,
}

impl CsvSource {
    /// Create a new CSV source from a file path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(path, CsvOptions::default())
    }

    /// Create a new CSV source with custom options
    pub fn with_options(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DataError::FileNotFound(path.display().to_string()));
        }

        let sheet_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Sheet1".to_string());

        Ok(Self {
            path: path.to_path_buf(),
            options,
            sheet_name,
        })
    }

    /// Delimiter in effect: the configured one or the sniffed one
    pub fn delimiter(&self) -> Result<u8> {
        if let Some(delimiter) = self.options.delimiter {
            return Ok(delimiter);
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let lines = reader
            .lines()
            .take(SNIFF_LINES)
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(sniff_delimiter(&lines, self.options.quote))
    }

    /// Read all records as strings
    pub fn read_all(&self) -> Result<Vec<Vec<String>>> {
        let delimiter = self.delimiter()?;
        let file = File::open(&self.path)?;

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .quote(self.options.quote)
            .has_headers(false)
            .trim(if self.options.trim {
                csv::Trim::All
            } else {
                csv::Trim::None
            })
            .flexible(true)
            .from_reader(BufReader::new(file));

        let mut result = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            result.push(record.iter().map(str::to_string).collect());
        }

        debug!(
            path = %self.path.display(),
            delimiter = %(delimiter as char).escape_default(),
            rows = result.len(),
            "csv read"
        );
        Ok(result)
    }
}

impl DataSource for CsvSource {
    fn list_sheets(&self) -> Result<Vec<String>> {
        Ok(vec![self.sheet_name.clone()])
    }

    fn default_sheet(&self) -> Option<String> {
        Some(self.sheet_name.clone())
    }

    fn read_sheet(&self, sheet: &str) -> Result<RawWorksheet> {
        if sheet != self.sheet_name {
            return Err(DataError::SheetNotFound(sheet.to_string()));
        }
        Ok(RawWorksheet::from_strings(sheet, &self.read_all()?))
    }
}

/// Pick the delimiter that splits the sample most consistently
///
/// A candidate scores when every non-empty line yields the same, non-zero
/// number of separators outside quotes; more separators win. Without a
/// consistent candidate the most frequent one is used, and comma when none
/// appears at all.
pub fn sniff_delimiter(lines: &[String], quote: u8) -> u8 {
    let lines: Vec<&String> = lines.iter().filter(|l| !l.trim().is_empty()).collect();
    let counts = |delimiter: u8| -> Vec<usize> {
        lines
            .iter()
            .map(|line| count_unquoted(line, delimiter, quote))
            .collect()
    };

    let mut best: Option<(u8, usize)> = None;
    for &delimiter in DELIMITERS {
        let per_line = counts(delimiter);
        let Some(&first) = per_line.first() else {
            continue;
        };
        if first > 0
            && per_line.iter().all(|&c| c == first)
            && best.map_or(true, |(_, n)| first > n)
        {
            best = Some((delimiter, first));
        }
    }
    if let Some((delimiter, _)) = best {
        return delimiter;
    }

    DELIMITERS
        .iter()
        .map(|&d| (d, counts(d).iter().sum::<usize>()))
        .filter(|&(_, total)| total > 0)
        .fold(None, |acc: Option<(u8, usize)>, (d, total)| match acc {
            Some((_, best)) if best >= total => acc,
            _ => Some((d, total)),
        })
        .map_or(b',', |(d, _)| d)
}

fn count_unquoted(line: &str, delimiter: u8, quote: u8) -> usize {
    let mut quoted = false;
    let mut count = 0;
    for &b in line.as_bytes() {
        if b == quote {
            quoted = !quoted;
        } else if b == delimiter && !quoted {
            count += 1;
        }
    }
    count
}
