// ABOUTME: TP-Service-Centre-Time-Stamp decoding (7 swapped-BCD octets)
// ABOUTME: Carries calendar fields plus a signed quarter-hour zone offset

use crate::codec::{PduError, PduReader, octet_to_bcd};

/// The service-center timestamp omits the century.
const TIMESTAMP_YEAR_OFFSET: u16 = 2000;

/// Sign bit of the timezone octet, the high bit of the first BCD digit.
const TIMEZONE_SIGN_BIT: u8 = 0x08;

/// Decoded TP-SCTS field of an SMS-DELIVER.
///
/// The six calendar fields are kept exactly as the service center coded
/// them; the offset octet is resolved to signed minutes. [`Self::unix_time`]
/// folds the offset into an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmsTimestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub tz_offset_minutes: i32,
}

impl SmsTimestamp {
    /// Read the 7-octet timestamp: six swapped-BCD decimal fields, then the
    /// quarter-hour timezone octet whose sign lives in bit 3.
    pub(crate) fn parse(reader: &mut PduReader) -> Result<SmsTimestamp, PduError> {
        let year = u16::from(reader.read_swapped_bcd_octet()?) + TIMESTAMP_YEAR_OFFSET;
        let month = reader.read_swapped_bcd_octet()?;
        let day = reader.read_swapped_bcd_octet()?;
        let hour = reader.read_swapped_bcd_octet()?;
        let minute = reader.read_swapped_bcd_octet()?;
        let second = reader.read_swapped_bcd_octet()?;

        let tz_octet = reader.read_octet()?;
        let quarter_hours = i32::from(octet_to_bcd(tz_octet & !TIMEZONE_SIGN_BIT));
        let tz_offset_minutes = if tz_octet & TIMEZONE_SIGN_BIT != 0 {
            -quarter_hours * 15
        } else {
            quarter_hours * 15
        };

        Ok(SmsTimestamp {
            year,
            month,
            day,
            hour,
            minute,
            second,
            tz_offset_minutes,
        })
    }

    /// Unix seconds for the timestamp with the zone offset applied in the
    /// direction the modem indicates.
    pub fn unix_time(&self) -> i64 {
        let days = days_from_civil(i64::from(self.year), self.month, self.day);
        let seconds = days * 86_400
            + i64::from(self.hour) * 3_600
            + i64::from(self.minute) * 60
            + i64::from(self.second);
        seconds + i64::from(self.tz_offset_minutes) * 60
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
fn days_from_civil(year: i64, month: u8, day: u8) -> i64 {
    let month = i64::from(month);
    let day = i64::from(day);
    let year = if month <= 2 { year - 1 } else { year };
    let era = if year >= 0 { year } else { year - 399 } / 400;
    let year_of_era = year - era * 400;
    let day_of_year = (153 * (if month > 2 { month - 3 } else { month + 9 }) + 2) / 5 + day - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * 146_097 + day_of_era - 719_468
}
