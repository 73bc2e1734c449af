//! Paged tabular view of a data series

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use cv_core::navigation::page_rows;
use cv_core::{DataKind, Dataset};

use crate::DataError;

/// One page of a series as a record batch.
///
/// Columns: `row` (0-based row index), `blank_info`, then `x_0..` and
/// `z_0..` for the first `max_points` sample points. Rows the series does
/// not have (it is shorter than the dataset) are null.
pub fn page_table(
    dataset: &Dataset,
    kind: DataKind,
    page: usize,
    rows_per_page: usize,
    max_points: usize,
) -> Result<RecordBatch, DataError> {
    let series = dataset
        .series(kind)
        .ok_or_else(|| DataError::NotFound(format!("{} data for {}", kind, dataset.coil)))?;

    let rows: Vec<usize> = page_rows(page, rows_per_page.max(1), dataset.row_count()).collect();
    let points = series.point_count().min(max_points);

    let mut fields = vec![
        Field::new("row", DataType::UInt64, false),
        Field::new("blank_info", DataType::UInt64, false),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(rows.iter().map(|&r| r as u64).collect::<Vec<_>>())),
        Arc::new(UInt64Array::from(
            rows.iter().map(|&r| dataset.display_number(r)).collect::<Vec<_>>(),
        )),
    ];

    for (axis, values) in [("x", &series.actual_x), ("z", &series.actual_z)] {
        for point in 0..points {
            let column: Vec<Option<f64>> = rows
                .iter()
                .map(|&r| values.get((r, point)).copied())
                .collect();
            fields.push(Field::new(format!("{}_{}", axis, point), DataType::Float64, true));
            columns.push(Arc::new(Float64Array::from(column)));
        }
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use cv_core::{BlankInfo, DataSeries, ReferenceOrigin};
    use ndarray::{Array1, Array2};
    use std::collections::BTreeMap;

    fn dataset() -> Dataset {
        let actual = Array2::from_shape_fn((7, 4), |(r, c)| (r * 10 + c) as f64);
        let series = DataSeries {
            actual_x: actual.clone(),
            actual_z: actual * -1.0,
            ref_x: Array1::zeros(1),
            ref_z: Array1::zeros(1),
            is_midpoint: vec![false],
            reference_origin: (ReferenceOrigin::SyntheticMean, ReferenceOrigin::SyntheticMean),
        };
        let mut map = BTreeMap::new();
        map.insert(DataKind::Bending, series);
        Dataset {
            coil: "coil51".to_string(),
            series: map,
            blank_info: BlankInfo::contiguous(13, 8),
        }
    }

    #[test]
    fn test_second_page() {
        let batch = page_table(&dataset(), DataKind::Bending, 2, 5, 2).unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 2 + 2 * 2);

        let blank = batch
            .column_by_name("blank_info")
            .unwrap()
            .as_any()
            .downcast_ref::<UInt64Array>()
            .unwrap();
        assert_eq!(blank.values().to_vec(), vec![18, 19, 20]);

        let x1 = batch
            .column_by_name("x_1")
            .unwrap()
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(x1.value(0), 51.0);
        assert!(x1.is_null(2));
    }

    #[test]
    fn test_missing_kind() {
        assert!(matches!(
            page_table(&dataset(), DataKind::Profile, 1, 5, 2),
            Err(DataError::NotFound(_))
        ));
    }
}
