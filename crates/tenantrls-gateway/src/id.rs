//! Record id generation: `{prefix}_{unix_millis}_{random}`.

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;

const SUFFIX_LEN: usize = 7;

pub fn generate(prefix: &str) -> String {
    let ts = Utc::now().timestamp_millis();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{prefix}_{ts}_{suffix}")
}
