use std::{fmt::Display, fs::File, io::Write, path::Path};

use chrono::{Local, NaiveDateTime};
use env_logger::{Env, Target};

pub const TIMESTAMP_FORMAT: &str = "%d-%b-%y %H:%M:%S";

/// One log line: `17-Oct-26 09:05:00 - message`.
pub fn format_line(timestamp: NaiveDateTime, message: impl Display) -> String {
    format!("{} - {}", timestamp.format(TIMESTAMP_FORMAT), message)
}

/// Send all log output to `path`, truncating it first. The filter defaults
/// to `warn` and follows `RUST_LOG` when set.
pub fn init(path: &Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .target(Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(buf, "{}", format_line(Local::now().naive_local(), record.args()))
        })
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::format_line;

    #[test]
    fn timestamped_line() {
        let at = NaiveDate::from_ymd_opt(2021, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        assert_eq!(
            format_line(at, "unable to process file: \"MCSUMM_bad.xlsx\""),
            "07-Mar-21 09:05:00 - unable to process file: \"MCSUMM_bad.xlsx\""
        );
    }
}
