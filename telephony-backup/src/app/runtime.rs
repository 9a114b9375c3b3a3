use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::Path,
};

use chrono::Local;
use tracing::info;

use telephony_database::{
    export::{export_blocked_numbers, export_call_log, export_contacts, export_messages},
    import::{import_blocked_numbers, import_call_log, import_contacts, import_messages},
    CancelToken, DeviceStore, Progress,
};

use crate::app::{
    error::RuntimeError,
    options::{Family, Mode, Options},
    progress::{build_progress_bar, update_progress_bar},
};

/// Note that the run was cancelled before printing its partial totals
fn report_cancelled(cancelled: bool) {
    if cancelled {
        println!("Cancelled; totals reflect the records processed so far");
    }
}

/// Stores the application state and handles the application lifecycle
pub struct Config {
    /// App configuration options
    pub options: Options,
    /// Cancellation token threaded through every run
    pub cancel: CancelToken,
}

impl Config {
    /// Create a new instance of the application
    pub fn new(options: Options) -> Config {
        Config {
            options,
            cancel: CancelToken::new(),
        }
    }

    /// Run the operation selected on the command line
    pub fn start(&self) -> Result<(), RuntimeError> {
        match &self.options.mode {
            Mode::Export(family, path) => self.export(*family, path)?,
            Mode::Import(family, path) => self.import(*family, path)?,
            Mode::AutoExport(directory) => self.auto_export(directory)?,
        }
        println!("Done!");
        Ok(())
    }

    fn export(&self, family: Family, path: &Path) -> Result<(), RuntimeError> {
        let store =
            DeviceStore::open_read_only(&self.options.db_path).map_err(RuntimeError::DatabaseError)?;
        let bar = build_progress_bar();
        let mut sink = |progress: Progress| update_progress_bar(&bar, progress);

        match family {
            Family::Messages => {
                let file = File::create(path).map_err(RuntimeError::DiskError)?;
                let totals = export_messages(
                    &store,
                    BufWriter::new(file),
                    &self.options.export_options,
                    &self.cancel,
                    &mut sink,
                )
                .map_err(RuntimeError::ExportError)?;
                bar.finish_and_clear();
                report_cancelled(totals.cancelled);
                println!(
                    "Exported {} SMS and {} MMS messages",
                    totals.sms, totals.mms
                );
            }
            Family::Calls => {
                let file = File::create(path).map_err(RuntimeError::DiskError)?;
                let total = export_call_log(
                    &store,
                    BufWriter::new(file),
                    &self.options.export_options,
                    &self.cancel,
                    &mut sink,
                )
                .map_err(RuntimeError::ExportError)?;
                bar.finish_and_clear();
                report_cancelled(total.cancelled);
                println!("Exported {} calls", total.count);
            }
            Family::Contacts => {
                let file = File::create(path).map_err(RuntimeError::DiskError)?;
                let total = export_contacts(
                    &store,
                    BufWriter::new(file),
                    &self.options.export_options,
                    &self.cancel,
                    &mut sink,
                )
                .map_err(RuntimeError::ExportError)?;
                bar.finish_and_clear();
                report_cancelled(total.cancelled);
                println!("Exported {} contacts", total.count);
            }
            Family::BlockedNumbers => {
                let file = File::create(path).map_err(RuntimeError::DiskError)?;
                let total = export_blocked_numbers(
                    &store,
                    BufWriter::new(file),
                    &self.options.export_options,
                    &self.cancel,
                    &mut sink,
                )
                .map_err(RuntimeError::ExportError)?;
                bar.finish_and_clear();
                report_cancelled(total.cancelled);
                println!("Exported {} blocked numbers", total.count);
            }
        }
        Ok(())
    }

    fn import(&self, family: Family, path: &Path) -> Result<(), RuntimeError> {
        let store = DeviceStore::open(&self.options.db_path).map_err(RuntimeError::DatabaseError)?;
        let bar = build_progress_bar();
        let mut sink = |progress: Progress| update_progress_bar(&bar, progress);
        let file = File::open(path).map_err(RuntimeError::DiskError)?;

        match family {
            Family::Messages => {
                let totals = import_messages(
                    &store,
                    BufReader::new(file),
                    &self.options.import_options,
                    &self.cancel,
                    &mut sink,
                )
                .map_err(RuntimeError::ImportError)?;
                bar.finish_and_clear();
                report_cancelled(totals.cancelled);
                println!(
                    "Imported {} SMS and {} MMS messages",
                    totals.sms, totals.mms
                );
            }
            Family::Calls => {
                let total = import_call_log(
                    &store,
                    BufReader::new(file),
                    &self.options.import_options,
                    &self.cancel,
                    &mut sink,
                )
                .map_err(RuntimeError::ImportError)?;
                bar.finish_and_clear();
                report_cancelled(total.cancelled);
                println!("Imported {} calls", total.count);
            }
            Family::Contacts => {
                let total = import_contacts(
                    &store,
                    BufReader::new(file),
                    &self.options.import_options,
                    &self.cancel,
                    &mut sink,
                )
                .map_err(RuntimeError::ImportError)?;
                bar.finish_and_clear();
                report_cancelled(total.cancelled);
                println!("Imported {} contacts", total.count);
            }
            Family::BlockedNumbers => {
                let total = import_blocked_numbers(
                    &store,
                    BufReader::new(file),
                    &self.options.import_options,
                    &self.cancel,
                    &mut sink,
                )
                .map_err(RuntimeError::ImportError)?;
                bar.finish_and_clear();
                report_cancelled(total.cancelled);
                println!("Imported {} blocked numbers", total.count);
            }
        }
        Ok(())
    }

    /// Export every family into `directory` with date-stamped filenames.
    ///
    /// Keeps going after a failed family so a backup saves as much as
    /// possible; the first error is reported at the end.
    fn auto_export(&self, directory: &Path) -> Result<(), RuntimeError> {
        fs::create_dir_all(directory).map_err(RuntimeError::DiskError)?;
        let date_stamp = Local::now().format("%Y-%m-%d").to_string();
        let mut first_error: Option<RuntimeError> = None;

        for (family, prefix, extension) in [
            (Family::Messages, "messages", "json"),
            (Family::Calls, "calls", "json"),
            (Family::Contacts, "contacts", "json"),
            (Family::BlockedNumbers, "blocked_numbers", "zip"),
        ] {
            let filename = format!("{prefix}-{date_stamp}.{extension}");
            let path = directory.join(&filename);
            info!("Beginning {family} export to {}", path.display());
            match self.export(family, &path) {
                Ok(()) => {
                    if self.options.delete_old_exports {
                        self.delete_old_exports(directory, &filename, prefix, extension)?;
                    }
                }
                Err(why) => {
                    eprintln!("Failed to export {family}: {why}");
                    first_error = first_error.or(Some(why));
                }
            }
        }

        match first_error {
            Some(why) => Err(why),
            None => Ok(()),
        }
    }

    /// Delete older exports sharing a prefix and extension, keeping the file
    /// that was just written
    fn delete_old_exports(
        &self,
        directory: &Path,
        keep: &str,
        prefix: &str,
        extension: &str,
    ) -> Result<(), RuntimeError> {
        info!("Deleting old exports ...");
        let mut total = 0;
        let entries = fs::read_dir(directory).map_err(RuntimeError::DiskError)?;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name != keep
                && name.starts_with(prefix)
                && name.ends_with(&format!(".{extension}"))
            {
                fs::remove_file(entry.path()).map_err(RuntimeError::DiskError)?;
                total += 1;
            }
        }
        info!("{total} exports deleted");
        Ok(())
    }
}
