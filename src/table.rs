//! Tab-separated sample tables.
//!
//! A table starts with a header row naming its columns; column order is free
//! and lines starting with '#' are skipped. TSS tables need `seqname`,
//! `start`, `strand` and `score` (`end` defaults to `start`). TSR tables may
//! identify regions by an `fhash` column instead of coordinates. A
//! `normalized_score` column declares the normalized schema for the table.
//! Files ending in `.gz` or `.bgz` are read through BGZF.

use crate::error::{Result, TsrError};
use crate::interval::{FeatureKey, GenomicInterval, Strand};
use crate::record::{Tsr, Tss};
use crate::schema::ScoreSchema;
use noodles::bgzf;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

const BGZF_HEADER_SIZE: usize = 18;
const NA: &str = "NA";

/// Check whether a file starts with a BGZF block header.
fn is_bgzf<R: Read + Seek>(reader: &mut R) -> std::io::Result<bool> {
    let mut header = [0u8; BGZF_HEADER_SIZE];
    let result = match reader.read_exact(&mut header) {
        Ok(()) => Ok(header[0..2] == [0x1f, 0x8b]
            && header[3] == 0x04
            && header[12..14] == [b'B', b'C']),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    };
    reader.seek(SeekFrom::Start(0))?;
    result
}

/// Open a table for reading, decompressing BGZF input.
pub fn open_table(path: &Path) -> Result<Box<dyn BufRead>> {
    let mut file = File::open(path)?;
    let compressed = path
        .extension()
        .is_some_and(|ext| ext == "gz" || ext == "bgz");

    if !compressed {
        return Ok(Box::new(BufReader::new(file)));
    }
    if !is_bgzf(&mut file)? {
        return Err(TsrError::Parse {
            line: 0,
            message: format!(
                "'{}' is regular gzip, not BGZF. Convert with: zcat '{}' | bgzip > table.tsv.gz",
                path.display(),
                path.display()
            ),
        });
    }
    Ok(Box::new(BufReader::new(bgzf::io::Reader::new(file))))
}

#[derive(Default)]
struct Columns {
    seqname: Option<usize>,
    start: Option<usize>,
    end: Option<usize>,
    strand: Option<usize>,
    score: Option<usize>,
    normalized_score: Option<usize>,
    n_unique: Option<usize>,
    fhash: Option<usize>,
    width: usize,
}

impl Columns {
    fn from_header(header: &str) -> Self {
        let mut columns = Columns::default();
        for (idx, name) in header.split('\t').enumerate() {
            let slot = match name.trim() {
                "seqname" | "chr" | "chrom" => &mut columns.seqname,
                "start" | "pos" => &mut columns.start,
                "end" => &mut columns.end,
                "strand" => &mut columns.strand,
                "score" => &mut columns.score,
                "normalized_score" => &mut columns.normalized_score,
                "n_unique" => &mut columns.n_unique,
                "fhash" | "FHASH" => &mut columns.fhash,
                _ => continue,
            };
            *slot = Some(idx);
            columns.width = idx + 1;
        }
        columns
    }

    fn has_coordinates(&self) -> bool {
        self.seqname.is_some() && self.start.is_some() && self.strand.is_some()
    }

    fn schema(&self) -> ScoreSchema {
        if self.normalized_score.is_some() {
            ScoreSchema::normalized()
        } else {
            ScoreSchema::raw()
        }
    }
}

struct Row<'a> {
    line: usize,
    fields: Vec<&'a str>,
}

impl<'a> Row<'a> {
    fn get(&self, column: Option<usize>, name: &str) -> Result<&'a str> {
        column
            .and_then(|idx| self.fields.get(idx).copied())
            .ok_or_else(|| self.error(format!("missing `{name}` value")))
    }

    fn number<N: std::str::FromStr>(&self, column: Option<usize>, name: &str) -> Result<N> {
        let value = self.get(column, name)?;
        value
            .trim()
            .parse::<N>()
            .map_err(|_| self.error(format!("invalid `{name}` value '{value}'")))
    }

    fn error(&self, message: String) -> TsrError {
        TsrError::Parse {
            line: self.line,
            message,
        }
    }
}

fn parse_interval(row: &Row<'_>, columns: &Columns) -> Result<GenomicInterval> {
    let (seqname, start, end, strand) = if columns.has_coordinates() {
        let start: i32 = row.number(columns.start, "start")?;
        let end: i32 = match columns.end {
            Some(_) => row.number(columns.end, "end")?,
            None => start,
        };
        let strand: Strand = row
            .get(columns.strand, "strand")?
            .trim()
            .parse()
            .map_err(|e: TsrError| row.error(e.to_string()))?;
        (row.get(columns.seqname, "seqname")?.to_string(), start, end, strand)
    } else {
        let key = FeatureKey::parse_fhash(row.get(columns.fhash, "fhash")?.trim())
            .map_err(|e| row.error(e.to_string()))?;
        (key.seqname, key.start, key.end, key.strand)
    };

    let mut interval = GenomicInterval::new(&seqname, start, end, strand, row.number(columns.score, "score")?);
    if columns.normalized_score.is_some() {
        interval.normalized_score = Some(row.number(columns.normalized_score, "normalized_score")?);
    }
    Ok(interval)
}

fn read_rows<R, T, F>(reader: R, mut parse: F) -> Result<(Vec<T>, ScoreSchema)>
where
    R: BufRead,
    F: FnMut(&Row<'_>, &Columns) -> Result<T>,
{
    let mut columns: Option<Columns> = None;
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.trim().is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some(columns) = columns.as_ref() else {
            let header = Columns::from_header(trimmed);
            if header.score.is_none() || !(header.has_coordinates() || header.fhash.is_some()) {
                return Err(TsrError::Parse {
                    line: idx + 1,
                    message: "header must name `score` and either `seqname`, `start`, `strand` or `fhash`".to_string(),
                });
            }
            columns = Some(header);
            continue;
        };

        let row = Row {
            line: idx + 1,
            fields: trimmed.split('\t').collect(),
        };
        if row.fields.len() < columns.width {
            return Err(row.error(format!(
                "expected at least {} fields, found {}",
                columns.width,
                row.fields.len()
            )));
        }
        records.push(parse(&row, columns)?);
    }

    let schema = columns.map(|c| c.schema()).unwrap_or_default();
    Ok((records, schema))
}

pub fn read_tss_table<R: BufRead>(reader: R) -> Result<(Vec<Tss>, ScoreSchema)> {
    read_rows(reader, |row, columns| parse_interval(row, columns).map(Tss::new))
}

pub fn read_tsr_table<R: BufRead>(reader: R) -> Result<(Vec<Tsr>, ScoreSchema)> {
    read_rows(reader, |row, columns| {
        let interval = parse_interval(row, columns)?;
        let n_unique = match columns.n_unique {
            Some(_) => row.number(columns.n_unique, "n_unique")?,
            None => 1,
        };
        Ok(Tsr { interval, n_unique })
    })
}

fn format_optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| NA.to_string(), |v| v.to_string())
}

fn write_interval<W: Write>(writer: &mut W, interval: &GenomicInterval, schema: &ScoreSchema) -> std::io::Result<()> {
    write!(
        writer,
        "{}\t{}\t{}\t{}\t{}",
        interval.seqname, interval.start, interval.end, interval.strand, interval.score
    )?;
    if schema.has(crate::schema::ScoreField::NormalizedScore) {
        write!(writer, "\t{}", format_optional(interval.normalized_score))?;
    }
    Ok(())
}

fn header(schema: &ScoreSchema) -> String {
    let mut header = String::from("seqname\tstart\tend\tstrand\tscore");
    if schema.has(crate::schema::ScoreField::NormalizedScore) {
        header.push_str("\tnormalized_score");
    }
    header
}

/// Write TSS records. Association columns are added when any record carries
/// an association; unmatched TSSs get `NA` in every TSR column.
pub fn write_tss_table<W: Write>(mut writer: W, records: &[Tss], schema: &ScoreSchema) -> Result<()> {
    let associated = records.iter().any(|tss| tss.association.is_some());
    let tsr_normalized = records
        .iter()
        .filter_map(|tss| tss.association.as_ref()?.tsr.as_ref())
        .any(|tsr| tsr.normalized_score.is_some());

    write!(writer, "{}", header(schema))?;
    if associated {
        write!(writer, "\ttsr_sample\tTSR_FHASH\ttsr_score\ttsr_width\ttsr_n_unique")?;
        if tsr_normalized {
            write!(writer, "\ttsr_normalized_score")?;
        }
        write!(writer, "\tdominant")?;
    }
    writeln!(writer)?;

    for tss in records {
        write_interval(&mut writer, &tss.interval, schema)?;
        if associated {
            let association = tss.association.as_ref();
            let tsr = association.and_then(|a| a.tsr.as_ref());
            write!(
                writer,
                "\t{}\t{}\t{}\t{}\t{}",
                format_optional(association.map(|a| a.tsr_sample.as_str())),
                format_optional(tsr.map(|t| t.fhash.as_str())),
                format_optional(tsr.map(|t| t.score)),
                format_optional(tsr.map(|t| t.width)),
                format_optional(tsr.map(|t| t.n_unique)),
            )?;
            if tsr_normalized {
                write!(writer, "\t{}", format_optional(tsr.and_then(|t| t.normalized_score)))?;
            }
            write!(writer, "\t{}", tss.is_dominant())?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_tsr_table<W: Write>(mut writer: W, records: &[Tsr], schema: &ScoreSchema) -> Result<()> {
    writeln!(writer, "{}\tn_unique\twidth\tFHASH", header(schema))?;
    for tsr in records {
        write_interval(&mut writer, &tsr.interval, schema)?;
        writeln!(writer, "\t{}\t{}\t{}", tsr.n_unique, tsr.width(), tsr.fhash())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Association, TsrSummary};
    use std::io::Cursor;

    #[test]
    fn test_read_tss_table_with_position_only() {
        let input = "# comment\nseqname\tstart\tstrand\tscore\nchr1\t100\t+\t4\n\nchr2\t7\t-\t1.5\n";
        let (records, schema) = read_tss_table(Cursor::new(input)).unwrap();

        assert_eq!(schema, ScoreSchema::raw());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].interval, GenomicInterval::position("chr1", 100, Strand::Forward, 4.0));
        assert_eq!(records[1].interval.fhash(), "chr2:7:7:-");
    }

    #[test]
    fn test_normalized_column_declares_schema() {
        let input = "strand\tstart\tend\tseqname\tscore\tnormalized_score\n+\t5\t5\tchr1\t2\t0.5\n";
        let (records, schema) = read_tss_table(Cursor::new(input)).unwrap();
        assert_eq!(schema, ScoreSchema::normalized());
        assert_eq!(records[0].interval.normalized_score, Some(0.5));
    }

    #[test]
    fn test_read_tsr_table_by_fhash() {
        let input = "FHASH\tscore\tn_unique\nchr1:100:110:+\t10\t3\n";
        let (records, _) = read_tsr_table(Cursor::new(input)).unwrap();
        assert_eq!(records[0].interval.start, 100);
        assert_eq!(records[0].interval.end, 110);
        assert_eq!(records[0].n_unique, 3);
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let bad_header = "seqname\tstart\n";
        assert!(matches!(
            read_tss_table(Cursor::new(bad_header)),
            Err(TsrError::Parse { line: 1, .. })
        ));

        let bad_value = "seqname\tstart\tstrand\tscore\nchr1\t100\t+\t4\nchr1\tx\t+\t4\n";
        assert!(matches!(
            read_tss_table(Cursor::new(bad_value)),
            Err(TsrError::Parse { line: 3, .. })
        ));

        let short = "seqname\tstart\tstrand\tscore\nchr1\t100\n";
        assert!(matches!(
            read_tss_table(Cursor::new(short)),
            Err(TsrError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_write_associated_tss_table() {
        let records = vec![
            Tss {
                interval: GenomicInterval::position("chr1", 100, Strand::Forward, 4.0),
                association: Some(Association {
                    tsr_sample: "s1".to_string(),
                    tsr: Some(TsrSummary {
                        fhash: "chr1:100:110:+".to_string(),
                        score: 10.0,
                        width: 11,
                        n_unique: 2,
                        normalized_score: None,
                    }),
                    dominant: true,
                }),
            },
            Tss {
                interval: GenomicInterval::position("chr1", 200, Strand::Forward, 1.0),
                association: Some(Association {
                    tsr_sample: "s1".to_string(),
                    tsr: None,
                    dominant: false,
                }),
            },
        ];

        let mut out = Vec::new();
        write_tss_table(&mut out, &records, &ScoreSchema::raw()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "seqname\tstart\tend\tstrand\tscore\ttsr_sample\tTSR_FHASH\ttsr_score\ttsr_width\ttsr_n_unique\tdominant"
        );
        assert_eq!(lines[1], "chr1\t100\t100\t+\t4\ts1\tchr1:100:110:+\t10\t11\t2\ttrue");
        assert_eq!(lines[2], "chr1\t200\t200\t+\t1\ts1\tNA\tNA\tNA\tNA\tfalse");
    }

    #[test]
    fn test_tsr_table_written_then_read() {
        let tsrs = vec![Tsr {
            interval: GenomicInterval::new("chr1", 100, 130, Strand::Reverse, 6.0).with_normalized_score(1.5),
            n_unique: 2,
        }];
        let mut out = Vec::new();
        write_tsr_table(&mut out, &tsrs, &ScoreSchema::normalized()).unwrap();

        let (read_back, schema) = read_tsr_table(Cursor::new(out)).unwrap();
        assert_eq!(schema, ScoreSchema::normalized());
        assert_eq!(read_back, tsrs);
    }
}
