use crate::model::DailyRecord;

/// One row of the yearly series artifact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearlyAqi {
    pub year: i32,
    pub mean_aqi: f64,
}

/// Arithmetic mean of the non-null `aqi` values, or `None` if every record's
/// AQI is null. A year with no observations is absent from the series, never
/// reported as zero.
pub fn mean_aqi(records: &[DailyRecord]) -> Option<f64> {
    let values: Vec<f64> = records.iter().filter_map(|r| r.aqi).collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Renders the series as the two-column `year,mean_aqi` delimited artifact,
/// one row per year.
pub fn render_csv(series: &[YearlyAqi]) -> String {
    let mut out = String::from("year,mean_aqi\n");
    for row in series {
        out.push_str(&format!("{},{}\n", row.year, row.mean_aqi));
    }
    out
}
