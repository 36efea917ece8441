// ABOUTME: SMS PDU parse and serialize per 3GPP TS 23.040
// ABOUTME: Sequential field walk over the hex octet stream, bounds-checked throughout

use crate::codec::{PduError, PduReader, PduWriter};
use crate::datatypes::{
    Address, Encoding, MAX_SEPTETS, MessageBody, MessageTiming, SmsMessage, SmsTimestamp, alphabet,
    read_sender_address, read_smsc_address, write_address,
};

// First-octet bits (TP-MTI and friends)
const MTI_SMS_SUBMIT: u8 = 0x01;
const UDHI: u8 = 0x40;
const VPF_RELATIVE: u8 = 0x10;
const VPF_ENHANCED: u8 = 0x08;
const VPF_ABSOLUTE: u8 = 0x18;
/// Any of the three validity-period formats flags the TP-VP field present.
const VPF_ANY: u8 = VPF_ABSOLUTE | VPF_RELATIVE | VPF_ENHANCED;

/// Parse one hex-encoded SMS-DELIVER or SMS-SUBMIT PDU.
///
/// Every field read is bounds-checked against the remaining octets; a
/// truncated PDU is a [`PduError::Truncated`], never a panic. An unsupported
/// data coding scheme still yields a message with all other fields decoded
/// and the body marked [`MessageBody::Unsupported`].
pub fn parse_message(pdu: &str) -> Result<SmsMessage, PduError> {
    let mut reader = PduReader::new(pdu);

    let smsc_len = reader.read_octet()? as usize;
    let smsc = if smsc_len > 0 {
        Some(read_smsc_address(&mut reader, smsc_len)?)
    } else {
        None
    };

    let first_octet = reader.read_octet()?;
    let is_submit = first_octet & MTI_SMS_SUBMIT != 0;
    let message_reference = if is_submit {
        Some(reader.read_octet()?)
    } else {
        None
    };

    let address = read_sender_address(&mut reader)?;
    let protocol_identifier = reader.read_octet()?;
    let data_coding_scheme = reader.read_octet()?;
    let encoding = Encoding::resolve(data_coding_scheme);

    // SMS-SUBMIT carries an optional validity period; SMS-DELIVER carries
    // the 7-octet service-center timestamp. Only the single-octet relative
    // validity form is decoded, regardless of which format is flagged.
    let timing = if is_submit {
        if first_octet & VPF_ANY != 0 {
            MessageTiming::ValidityPeriod(reader.read_octet()?)
        } else {
            MessageTiming::None
        }
    } else {
        MessageTiming::Timestamp(SmsTimestamp::parse(&mut reader)?)
    };

    let user_data_len = reader.read_octet()? as usize;
    let body = read_user_data(&mut reader, user_data_len, encoding)?;

    Ok(SmsMessage {
        smsc,
        address,
        protocol_identifier,
        data_coding_scheme,
        body,
        timing,
        message_reference,
    })
}

/// Decode the user data per the resolved encoding. The length octet counts
/// septets for the 7-bit alphabet and octets otherwise.
fn read_user_data(
    reader: &mut PduReader,
    length: usize,
    encoding: Encoding,
) -> Result<MessageBody, PduError> {
    match encoding {
        Encoding::Gsm7 => {
            if length > MAX_SEPTETS {
                return Err(PduError::UserDataTooLong(length));
            }
            let mut octets = Vec::with_capacity(alphabet::packed_len(length));
            for _ in 0..alphabet::packed_len(length) {
                octets.push(reader.read_octet()?);
            }
            Ok(MessageBody::Text(alphabet::unpack(&octets, length)))
        }
        other => Ok(MessageBody::Unsupported(other)),
    }
}

/// Builder for an outbound SMS-SUBMIT PDU.
///
/// ```rust
/// use ril::SubmitPdu;
///
/// let hex = SubmitPdu::new("123456", "test123").to_hex().unwrap();
/// assert!(hex.starts_with("000100"));
/// ```
#[derive(Debug, Clone)]
pub struct SubmitPdu {
    pub smsc: Option<Address>,
    pub destination: Address,
    pub text: String,
    /// Relative validity period; sets the VPF bits and appends the octet.
    pub validity_period: Option<u8>,
    /// Flags a user-data header at the start of the UD field.
    pub udhi: bool,
}

impl SubmitPdu {
    pub fn new(destination: &str, text: &str) -> SubmitPdu {
        SubmitPdu {
            smsc: None,
            destination: Address::new(destination),
            text: text.to_string(),
            validity_period: None,
            udhi: false,
        }
    }

    pub fn smsc(mut self, smsc: &str) -> SubmitPdu {
        self.smsc = Some(Address::new(smsc));
        self
    }

    pub fn validity_period(mut self, validity_period: u8) -> SubmitPdu {
        self.validity_period = Some(validity_period);
        self
    }

    /// Serialize to hex text: optional SMSC octets, first octet and message
    /// reference, destination address, protocol identifier, DCS, optional
    /// validity period, user-data length, packed user data.
    pub fn to_hex(&self) -> Result<String, PduError> {
        let mut writer = PduWriter::new();

        match &self.smsc {
            Some(smsc) => write_address(&mut writer, smsc, true)?,
            None => writer.write_octet(0x00),
        }

        let mut first_octet = MTI_SMS_SUBMIT;
        if self.validity_period.is_some() {
            first_octet |= VPF_RELATIVE;
        }
        if self.udhi {
            first_octet |= UDHI;
        }
        writer.write_octet(first_octet);
        // TP-MR; the modem fills in the real reference.
        writer.write_octet(0x00);

        write_address(&mut writer, &self.destination, false)?;

        // TP-PID: default store-and-forward.
        writer.write_octet(0x00);
        writer.write_octet(Encoding::Gsm7.dcs_bits());

        if let Some(validity) = self.validity_period {
            writer.write_octet(validity);
        }

        let septet_count = self.text.chars().count();
        if septet_count > MAX_SEPTETS {
            return Err(PduError::UserDataTooLong(septet_count));
        }
        writer.write_octet(septet_count as u8);
        for octet in alphabet::pack(&self.text)? {
            writer.write_octet(octet);
        }

        Ok(writer.finish())
    }
}
