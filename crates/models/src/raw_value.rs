/// RawValue is like serde_json::value::RawValue, but removes newlines to ensure
/// values can safely be used in newline-delimited contexts.
///
/// Query models are carried as RawValues so that fields which migration
/// doesn't inspect pass through exactly as the legacy alert stored them.
///
/// As it uses serde_json::RawValue, it MUST be deserialized using serde_json
/// and not serde_yaml or some other Deserializer. This may require first
/// transcoding to serde_json::Value and then using serde_json::from_value().
#[derive(serde::Serialize, Clone)]
pub struct RawValue(Box<serde_json::value::RawValue>);

// RawValues are only equal if they are byte-for-byte identical,
// except for leading and trailing whitespace.
impl std::cmp::PartialEq<RawValue> for RawValue {
    fn eq(&self, other: &RawValue) -> bool {
        self.get().trim() == other.get().trim()
    }
}

impl RawValue {
    pub fn from_str(s: &str) -> serde_json::Result<Self> {
        Self::from_string(s.to_owned())
    }
    pub fn from_string(mut s: String) -> serde_json::Result<Self> {
        s.retain(|c| c != '\n'); // Strip newlines.
        let value = serde_json::value::RawValue::from_string(s)?;
        Ok(Self(value))
    }
    /// Serialize `value` into a RawValue.
    pub fn from_serialize<T: serde::Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        Self::from_string(serde_json::to_string(value)?)
    }
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(self.get())
    }
}

impl<'de> serde::Deserialize<'de> for RawValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let inner = Box::<serde_json::value::RawValue>::deserialize(deserializer)?;

        if inner.get().contains('\n') {
            let s: Box<str> = inner.into();
            Self::from_string(s.into()).map_err(D::Error::custom)
        } else {
            Ok(Self(inner))
        }
    }
}

impl From<RawValue> for Box<serde_json::value::RawValue> {
    fn from(RawValue(inner): RawValue) -> Self {
        inner
    }
}

impl std::ops::Deref for RawValue {
    type Target = serde_json::value::RawValue;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Debug for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.get())
    }
}
