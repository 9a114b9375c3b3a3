use std::{
    fmt::{Display, Formatter},
    path::PathBuf,
};

use clap::{crate_version, Arg, ArgAction, ArgMatches, Command};

use telephony_database::{
    options::{ExportOptions, ImportOptions},
    util::filters::{parse_filters, MessageFilter},
};

use crate::app::error::RuntimeError;

// CLI Arg Names
pub const OPTION_DB_PATH: &str = "db-path";
pub const OPTION_EXPORT: &str = "export";
pub const OPTION_IMPORT: &str = "import";
pub const OPTION_OUTPUT: &str = "output";
pub const OPTION_INPUT: &str = "input";
pub const OPTION_AUTO_EXPORT: &str = "auto-export";
pub const OPTION_DELETE_OLD_EXPORTS: &str = "delete-old-exports";
pub const OPTION_NO_SMS: &str = "no-sms";
pub const OPTION_NO_MMS: &str = "no-mms";
pub const OPTION_NO_BINARY_DATA: &str = "no-binary-data";
pub const OPTION_DEDUPLICATION: &str = "deduplication";
pub const OPTION_MAX_RECORDS: &str = "max-records";
pub const OPTION_MESSAGE_FILTERS: &str = "message-filters";
pub const OPTION_VERBOSE: &str = "verbose";

// Other CLI Text
pub const SUPPORTED_FAMILIES: &str = "messages, calls, contacts, blocked-numbers";
pub const ABOUT: &str = concat!(
    "The `telephony-backup` binary exports a device telephony store\n",
    "(SMS and MMS messages, call log, contacts, blocked numbers) to\n",
    "portable JSON / NDJSON files, and imports those files back."
);

/// The table family a single run operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Messages,
    Calls,
    Contacts,
    BlockedNumbers,
}

impl Family {
    pub fn from_cli(family: &str) -> Option<Self> {
        match family {
            "messages" => Some(Family::Messages),
            "calls" => Some(Family::Calls),
            "contacts" => Some(Family::Contacts),
            "blocked-numbers" => Some(Family::BlockedNumbers),
            _ => None,
        }
    }
}

impl Display for Family {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Family::Messages => write!(fmt, "messages"),
            Family::Calls => write!(fmt, "calls"),
            Family::Contacts => write!(fmt, "contacts"),
            Family::BlockedNumbers => write!(fmt, "blocked-numbers"),
        }
    }
}

/// What a single invocation does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Export one family to the given file
    Export(Family, PathBuf),
    /// Import one family from the given file
    Import(Family, PathBuf),
    /// Export messages, calls, contacts, and blocked numbers into a
    /// directory with date-stamped filenames
    AutoExport(PathBuf),
}

pub struct Options {
    /// Path to the device store database file
    pub db_path: PathBuf,
    /// The operation to run
    pub mode: Mode,
    /// Delete older date-stamped exports after a successful automatic export
    pub delete_old_exports: bool,
    /// Engine configuration for exports
    pub export_options: ExportOptions,
    /// Engine configuration for imports
    pub import_options: ImportOptions,
    /// Emit debug logging
    pub verbose: bool,
}

impl Options {
    pub fn from_args(args: &ArgMatches) -> Result<Self, RuntimeError> {
        let db_path = args
            .get_one::<String>(OPTION_DB_PATH)
            .ok_or_else(|| {
                RuntimeError::InvalidOptions(format!("Option {OPTION_DB_PATH} is required"))
            })?;
        let export_family = args.get_one::<String>(OPTION_EXPORT);
        let import_family = args.get_one::<String>(OPTION_IMPORT);
        let auto_export_dir = args.get_one::<String>(OPTION_AUTO_EXPORT);
        let output = args.get_one::<String>(OPTION_OUTPUT);
        let input = args.get_one::<String>(OPTION_INPUT);
        let delete_old_exports = args.get_flag(OPTION_DELETE_OLD_EXPORTS);
        let no_sms = args.get_flag(OPTION_NO_SMS);
        let no_mms = args.get_flag(OPTION_NO_MMS);
        let no_binary_data = args.get_flag(OPTION_NO_BINARY_DATA);
        let deduplication = args.get_flag(OPTION_DEDUPLICATION);
        let max_records = args.get_one::<String>(OPTION_MAX_RECORDS);
        let message_filters = args.get_one::<String>(OPTION_MESSAGE_FILTERS);
        let verbose = args.get_flag(OPTION_VERBOSE);

        // Exactly one operation per invocation
        let modes_selected = [
            export_family.is_some(),
            import_family.is_some(),
            auto_export_dir.is_some(),
        ]
        .iter()
        .filter(|selected| **selected)
        .count();
        if modes_selected == 0 {
            return Err(RuntimeError::InvalidOptions(format!(
                "Nothing to do; specify one of --{OPTION_EXPORT}, --{OPTION_IMPORT}, or --{OPTION_AUTO_EXPORT}"
            )));
        }
        if modes_selected > 1 {
            return Err(RuntimeError::InvalidOptions(format!(
                "Options {OPTION_EXPORT}, {OPTION_IMPORT}, and {OPTION_AUTO_EXPORT} are mutually exclusive"
            )));
        }

        // Ensure dependent options make sense for the selected operation
        if output.is_some() && export_family.is_none() {
            return Err(RuntimeError::InvalidOptions(format!(
                "Option {OPTION_OUTPUT} is enabled, which requires `--{OPTION_EXPORT}`"
            )));
        }
        if input.is_some() && import_family.is_none() {
            return Err(RuntimeError::InvalidOptions(format!(
                "Option {OPTION_INPUT} is enabled, which requires `--{OPTION_IMPORT}`"
            )));
        }
        if deduplication && import_family.is_none() {
            return Err(RuntimeError::InvalidOptions(format!(
                "Option {OPTION_DEDUPLICATION} is enabled, which requires `--{OPTION_IMPORT}`"
            )));
        }
        if message_filters.is_some() && import_family.is_some() {
            return Err(RuntimeError::InvalidOptions(format!(
                "Option {OPTION_MESSAGE_FILTERS} applies to exports only"
            )));
        }
        if delete_old_exports && auto_export_dir.is_none() {
            return Err(RuntimeError::InvalidOptions(format!(
                "Option {OPTION_DELETE_OLD_EXPORTS} is enabled, which requires `--{OPTION_AUTO_EXPORT}`"
            )));
        }

        let mode = if let Some(family) = export_family {
            let family = parse_family(family)?;
            let output = output.ok_or_else(|| {
                RuntimeError::InvalidOptions(format!(
                    "Option {OPTION_EXPORT} requires `--{OPTION_OUTPUT}`"
                ))
            })?;
            Mode::Export(family, PathBuf::from(output))
        } else if let Some(family) = import_family {
            let family = parse_family(family)?;
            let input = input.ok_or_else(|| {
                RuntimeError::InvalidOptions(format!(
                    "Option {OPTION_IMPORT} requires `--{OPTION_INPUT}`"
                ))
            })?;
            Mode::Import(family, PathBuf::from(input))
        } else {
            // Guarded above, so auto_export_dir is present here
            Mode::AutoExport(PathBuf::from(auto_export_dir.map(String::as_str).unwrap_or(".")))
        };

        let max_records = match max_records {
            Some(cap) => Some(cap.parse::<u64>().map_err(|_| {
                RuntimeError::InvalidOptions(format!(
                    "{cap} is not a valid record cap! Must be a non-negative integer"
                ))
            })?),
            None => None,
        };

        let filters: Vec<MessageFilter> = match message_filters {
            Some(json) => parse_filters(json).map_err(|why| {
                RuntimeError::InvalidOptions(format!("Invalid message filter list: {why}"))
            })?,
            None => Vec::new(),
        };

        let export_options = ExportOptions {
            sms: !no_sms,
            mms: !no_mms,
            include_binary_data: !no_binary_data,
            max_records,
            message_filtering: !filters.is_empty(),
            message_filters: filters,
        };
        let import_options = ImportOptions {
            sms: !no_sms,
            mms: !no_mms,
            include_binary_data: !no_binary_data,
            deduplication,
            max_records,
        };

        Ok(Options {
            db_path: PathBuf::from(db_path),
            mode,
            delete_old_exports,
            export_options,
            import_options,
            verbose,
        })
    }
}

fn parse_family(family: &str) -> Result<Family, RuntimeError> {
    Family::from_cli(family).ok_or_else(|| {
        RuntimeError::InvalidOptions(format!(
            "{family} is not a valid table family! Must be one of <{SUPPORTED_FAMILIES}>"
        ))
    })
}

fn build_command() -> Command {
    Command::new("Telephony Backup")
        .version(crate_version!())
        .about(ABOUT)
        .arg_required_else_help(true)
        .arg(
            Arg::new(OPTION_DB_PATH)
                .short('p')
                .long(OPTION_DB_PATH)
                .help("Specify the path of the device store database file")
                .num_args(1)
                .display_order(0)
                .value_name("path/to/store.db"),
        )
        .arg(
            Arg::new(OPTION_EXPORT)
                .short('e')
                .long(OPTION_EXPORT)
                .help("Export one table family; requires --output")
                .num_args(1)
                .display_order(1)
                .value_name(SUPPORTED_FAMILIES),
        )
        .arg(
            Arg::new(OPTION_IMPORT)
                .short('i')
                .long(OPTION_IMPORT)
                .help("Import one table family; requires --input")
                .num_args(1)
                .display_order(2)
                .value_name(SUPPORTED_FAMILIES),
        )
        .arg(
            Arg::new(OPTION_OUTPUT)
                .short('o')
                .long(OPTION_OUTPUT)
                .help("Where to write the exported file")
                .num_args(1)
                .display_order(3)
                .value_name("path/to/file"),
        )
        .arg(
            Arg::new(OPTION_INPUT)
                .short('f')
                .long(OPTION_INPUT)
                .help("The file to import")
                .num_args(1)
                .display_order(4)
                .value_name("path/to/file"),
        )
        .arg(
            Arg::new(OPTION_AUTO_EXPORT)
                .short('a')
                .long(OPTION_AUTO_EXPORT)
                .help("Export every table family into a directory using date-stamped filenames")
                .num_args(1)
                .display_order(5)
                .value_name("path/to/directory"),
        )
        .arg(
            Arg::new(OPTION_DELETE_OLD_EXPORTS)
                .long(OPTION_DELETE_OLD_EXPORTS)
                .help("After a successful automatic export, delete older exports with the same prefix")
                .action(ArgAction::SetTrue)
                .display_order(6),
        )
        .arg(
            Arg::new(OPTION_NO_SMS)
                .long(OPTION_NO_SMS)
                .help("Skip SMS messages when exporting or importing messages")
                .action(ArgAction::SetTrue)
                .display_order(7),
        )
        .arg(
            Arg::new(OPTION_NO_MMS)
                .long(OPTION_NO_MMS)
                .help("Skip MMS messages when exporting or importing messages")
                .action(ArgAction::SetTrue)
                .display_order(8),
        )
        .arg(
            Arg::new(OPTION_NO_BINARY_DATA)
                .long(OPTION_NO_BINARY_DATA)
                .help("Do not embed or restore MMS part binary content")
                .action(ArgAction::SetTrue)
                .display_order(9),
        )
        .arg(
            Arg::new(OPTION_DEDUPLICATION)
                .short('d')
                .long(OPTION_DEDUPLICATION)
                .help("Skip records that already exist in the destination store")
                .action(ArgAction::SetTrue)
                .display_order(10),
        )
        .arg(
            Arg::new(OPTION_MAX_RECORDS)
                .short('m')
                .long(OPTION_MAX_RECORDS)
                .help("Stop each table family after this many records (debugging aid)")
                .num_args(1)
                .display_order(11)
                .value_name("N"),
        )
        .arg(
            Arg::new(OPTION_MESSAGE_FILTERS)
                .long(OPTION_MESSAGE_FILTERS)
                .help("A JSON list of message filters to apply when exporting messages")
                .num_args(1)
                .display_order(12)
                .value_name("json"),
        )
        .arg(
            Arg::new(OPTION_VERBOSE)
                .short('v')
                .long(OPTION_VERBOSE)
                .help("Emit debug logging to stderr")
                .action(ArgAction::SetTrue)
                .display_order(13),
        )
}

pub fn from_command_line() -> ArgMatches {
    build_command().get_matches()
}
