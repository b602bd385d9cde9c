use chrono::Utc;
use rand::Rng;

/// Human-facing invoice number: prefix, four random digits, then the last
/// four digits of the current epoch millis. Collisions are unlikely enough
/// for a per-clinic billing ledger.
pub fn invoice_number(prefix: &str) -> String {
    let random: u32 = rand::thread_rng().gen_range(1000..10000);
    let millis = Utc::now().timestamp_millis();
    format!("{}-{}{:04}", prefix, random, millis % 10000)
}

/// Medical record number for a newly registered patient: registration year
/// plus a per-clinic running sequence.
pub fn medical_record_number(year: i32, seq: u64) -> String {
    format!("P{}{:04}", year, seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_number_has_prefix_and_eight_digits() {
        let number = invoice_number("INV");
        let (prefix, digits) = number.split_once('-').unwrap();
        assert_eq!(prefix, "INV");
        assert_eq!(digits.len(), 8);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn mrn_embeds_year_and_sequence() {
        assert_eq!(medical_record_number(2026, 7), "P20260007");
    }
}
