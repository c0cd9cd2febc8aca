//! Bank reference codes for processed transfers

use chrono::NaiveDate;
use corebank_core::TransferId;

/// Build the user-visible reference code assigned at Processed.
///
/// Format: `FT` + processing date as `YYYYMMDD` + the zero-padded
/// transfer id, e.g. `FT2024030100000042` for transfer 42 on 2024-03-01.
pub fn reference_code(processed_on: NaiveDate, id: TransferId) -> String {
    format!("FT{}{:08}", processed_on.format("%Y%m%d"), id.value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_code_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(reference_code(date, TransferId(42)), "FT2024030100000042");
    }

    #[test]
    fn test_reference_code_large_id() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(
            reference_code(date, TransferId(123456789)),
            "FT20251231123456789"
        );
    }
}
