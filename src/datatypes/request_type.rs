use num_enum::TryFromPrimitive;

/// RIL parcel type codes.
///
/// Codes below 1000 are solicited requests originated by this side; codes
/// at 1000 and above are unsolicited indications pushed by the modem.
#[derive(TryFromPrimitive)]
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RequestType {
    GetSimStatus = 1,
    EnterSimPin = 2,
    GetCurrentCalls = 9,
    Dial = 10,
    GetImsi = 11,
    Hangup = 12,
    SignalStrength = 19,
    VoiceRegistrationState = 20,
    DataRegistrationState = 21,
    Operator = 22,
    RadioPower = 23,
    SendSms = 25,
    SetupDataCall = 27,
    SmsAcknowledge = 37,
    GetImei = 38,
    Answer = 40,
    // Unsolicited indications
    UnsolRadioStateChanged = 1000,
    UnsolCallStateChanged = 1001,
    UnsolVoiceNetworkStateChanged = 1002,
    UnsolNewSms = 1003,
    UnsolNewSmsStatusReport = 1004,
    UnsolOnUssd = 1006,
    UnsolNitzTimeReceived = 1008,
    UnsolSignalStrength = 1009,
}

impl RequestType {
    /// Check whether this code is an unsolicited indication rather than a
    /// request this side can originate.
    pub fn is_unsolicited(&self) -> bool {
        (*self as u32) >= 1000
    }
}

impl From<RequestType> for u32 {
    fn from(value: RequestType) -> u32 {
        value as u32
    }
}
