/*!
 Run configuration consumed by the export walkers and import reconcilers.

 These flags mirror the user's persisted settings: per-family toggles, the
 binary payload switch, deduplication, the debug record cap, and the message
 filter list.
*/

use crate::util::filters::MessageFilter;

/// Configuration for one export run
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Include SMS messages in message exports
    pub sms: bool,
    /// Include MMS messages in message exports
    pub mms: bool,
    /// Fetch and embed part binary content
    pub include_binary_data: bool,
    /// Stop each family's walk after this many rows (debug aid)
    pub max_records: Option<u64>,
    /// Master toggle for the message filter list
    pub message_filtering: bool,
    /// User-declared message filters
    pub message_filters: Vec<MessageFilter>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            sms: true,
            mms: true,
            include_binary_data: true,
            max_records: None,
            message_filtering: false,
            message_filters: Vec::new(),
        }
    }
}

impl ExportOptions {
    /// The filters to apply, or none when filtering is switched off
    pub fn active_filters(&self) -> &[MessageFilter] {
        if self.message_filtering {
            &self.message_filters
        } else {
            &[]
        }
    }
}

/// Configuration for one import run
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Import SMS messages
    pub sms: bool,
    /// Import MMS messages
    pub mms: bool,
    /// Restore part binary content
    pub include_binary_data: bool,
    /// Skip records that already exist in the destination
    pub deduplication: bool,
    /// Stop counting each family after this many rows (debug aid)
    pub max_records: Option<u64>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            sms: true,
            mms: true,
            include_binary_data: true,
            deduplication: false,
            max_records: None,
        }
    }
}
