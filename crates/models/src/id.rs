// Length of generated rule UIDs. Well under the 40 byte maximum of the
// alerting engine, while retaining ~56 bits of randomness.
const SHORT_UID_LEN: usize = 14;

/// Generate a short, random UID for a migrated rule.
/// UIDs are lower-case hex and always begin with a letter.
pub fn generate_short_uid() -> String {
    let mut uid = uuid::Uuid::new_v4().simple().to_string();
    uid.truncate(SHORT_UID_LEN);

    // Map a leading digit onto 'g'..='p', which are outside of the hex alphabet
    // and cannot collide with another UID's leading letter.
    if let Some(first) = uid.chars().next().and_then(|c| c.to_digit(10)) {
        let letter = char::from(b'g' + first as u8);
        uid.replace_range(0..1, &letter.to_string());
    }
    uid
}
