use crate::error::{Result, TsrError};
use crate::interval::GenomicInterval;
use crate::record::Tsr;
use crate::schema::ScoreSchema;

/// Reduce one merge group to a summary interval.
///
/// Bounds are taken from the members' own coordinates, every field declared
/// by `schema` is summed, and `n_unique` counts the members. A member lacking
/// a declared field aborts the aggregation.
pub fn aggregate<'a, I>(sample: &str, schema: &ScoreSchema, members: I) -> Result<Tsr>
where
    I: IntoIterator<Item = &'a GenomicInterval>,
{
    let mut members = members.into_iter();
    let first = members
        .next()
        .ok_or_else(|| TsrError::invalid_parameter("group", format!("empty merge group in sample '{sample}'")))?;

    let fields = schema.fields();
    let mut sums = vec![0.0; fields.len()];
    let mut start = first.start;
    let mut end = first.end;
    let mut n_unique: u32 = 0;

    for member in std::iter::once(first).chain(members) {
        start = start.min(member.start);
        end = end.max(member.end);
        n_unique += 1;
        for (sum, field) in sums.iter_mut().zip(fields) {
            *sum += field.get(member).ok_or_else(|| TsrError::MissingField {
                sample: sample.to_string(),
                field: field.name(),
                fhash: member.fhash(),
            })?;
        }
    }

    let mut interval = GenomicInterval::new(&first.seqname, start, end, first.strand, 0.0);
    for (sum, field) in sums.into_iter().zip(fields) {
        field.set(&mut interval, sum);
    }

    Ok(Tsr { interval, n_unique })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Strand;

    #[test]
    fn test_aggregate_sums_and_bounds() {
        let members = [
            GenomicInterval::position("chr1", 120, Strand::Forward, 2.0),
            GenomicInterval::position("chr1", 100, Strand::Forward, 3.0),
            GenomicInterval::new("chr1", 105, 130, Strand::Forward, 1.5),
        ];
        let tsr = aggregate("s1", &ScoreSchema::raw(), members.iter()).unwrap();

        assert_eq!((tsr.interval.start, tsr.interval.end), (100, 130));
        assert_eq!(tsr.interval.score, 6.5);
        assert_eq!(tsr.interval.normalized_score, None);
        assert_eq!(tsr.n_unique, 3);
        assert_eq!(tsr.width(), 31);
    }

    #[test]
    fn test_aggregate_normalized_requires_every_member() {
        let complete = [
            GenomicInterval::position("chr2", 10, Strand::Reverse, 1.0).with_normalized_score(0.25),
            GenomicInterval::position("chr2", 11, Strand::Reverse, 1.0).with_normalized_score(0.5),
        ];
        let tsr = aggregate("s1", &ScoreSchema::normalized(), complete.iter()).unwrap();
        assert_eq!(tsr.interval.normalized_score, Some(0.75));
        assert_eq!(tsr.interval.strand, Strand::Reverse);

        let mixed = [
            GenomicInterval::position("chr2", 10, Strand::Reverse, 1.0).with_normalized_score(0.25),
            GenomicInterval::position("chr2", 11, Strand::Reverse, 1.0),
        ];
        assert!(matches!(
            aggregate("s1", &ScoreSchema::normalized(), mixed.iter()),
            Err(TsrError::MissingField { field: "normalized_score", .. })
        ));
    }

    #[test]
    fn test_aggregate_empty_group_is_an_error() {
        let empty: [GenomicInterval; 0] = [];
        assert!(aggregate("s1", &ScoreSchema::raw(), empty.iter()).is_err());
    }
}
