// ============================================================
// Layer 3: Raw Record Domain Type
// ============================================================
// One file-audit event as it appears in the input file,
// projected down to the four fields the pipeline uses.
//
// Input keys (one JSON object per line):
//   fil_creatn_dt    → creation_date  "2024-01-15"
//   fil_creatn_time  → creation_time  "13.05.09"  (dots, not colons)
//   fil_id           → file_id        string or number
//   in_tot_rec_cnt   → record_count   non-negative integer

use serde::{Deserialize, Serialize};

/// A single audit event. Never mutated after it is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub creation_date: String,
    pub creation_time: String,
    pub file_id:       String,
    pub record_count:  u64,
}

impl RawRecord {
    pub fn new(
        creation_date: impl Into<String>,
        creation_time: impl Into<String>,
        file_id:       impl Into<String>,
        record_count:  u64,
    ) -> Self {
        Self {
            creation_date: creation_date.into(),
            creation_time: creation_time.into(),
            file_id:       file_id.into(),
            record_count,
        }
    }
}
