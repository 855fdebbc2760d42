mod id;
mod legacy;
mod raw_value;
mod rule;
mod silence;

pub use id::generate_short_uid;
pub use legacy::{
    AlertNotification, DashAlertSettings, DashboardUpgradeInfo, ExecutionErrorOption,
    LegacyAlert, NoDataOption, NotificationKey,
};
pub use raw_value::RawValue;
pub use rule::{
    AlertQuery, AlertRule, Condition, ExecutionErrorState, NoDataState, RelativeTimeRange,
    EXPRESSION_DATASOURCE_UID,
};
pub use silence::{MatchType, Matcher, Silence, SilenceKind};

use caseless::Caseless;
use unicode_normalization::UnicodeNormalization;

/// Map input characters (e.x. String::chars()) into its collated form,
/// which ignores casing and is unicode-normalized.
/// This follows the conformance guidelines in:
/// http://www.unicode.org/versions/Unicode13.0.0/ch03.pdf
/// in Section 3.13 - "Default Caseless Matching" (all the way at the bottom).
pub fn collate<I>(i: I) -> impl Iterator<Item = char>
where
    I: Iterator<Item = char>,
{
    i.nfd().default_case_fold().nfkc()
}
