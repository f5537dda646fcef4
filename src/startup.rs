//! Command-line startup options.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::{MAX_COLUMNS_PER_ROW, MAX_PAGE_SIZE};
use crate::error::{AppError, Result};
use crate::file_utils;
use crate::state::SortCriterion;

pub const USAGE: &str = "Usage: parquet-media-viewer [FILE.parquet] [--page N] [--search TEXT] \
[--sort none|name|recent] [--columns N] [--page-size N] [--out SHEET.png]";

/// What to open and do once the first page is shown.
#[derive(Debug, Clone, PartialEq)]
pub struct StartupOptions {
    /// Data file to open; the last opened file is used when absent.
    pub file: Option<PathBuf>,
    pub page: usize,
    pub search: Option<String>,
    pub sort: SortCriterion,
    pub columns: Option<usize>,
    pub page_size: Option<usize>,
    /// Where to write the rendered contact sheet.
    pub output: Option<PathBuf>,
    pub help: bool,
}

impl Default for StartupOptions {
    fn default() -> Self {
        Self {
            file: None,
            page: 1,
            search: None,
            sort: SortCriterion::None,
            columns: None,
            page_size: None,
            output: None,
            help: false,
        }
    }
}

impl StartupOptions {
    pub fn from_env() -> Result<Self> {
        Self::parse(std::env::args_os().skip(1))
    }

    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let arg_str = arg.to_string_lossy().into_owned();
            match arg_str.as_str() {
                "-h" | "--help" => options.help = true,
                "--page" => options.page = parse_count("--page", args.next(), usize::MAX)?,
                "--columns" => {
                    options.columns =
                        Some(parse_count("--columns", args.next(), MAX_COLUMNS_PER_ROW)?)
                }
                "--page-size" => {
                    options.page_size =
                        Some(parse_count("--page-size", args.next(), MAX_PAGE_SIZE)?)
                }
                "--search" => options.search = Some(required("--search", args.next())?),
                "--sort" => {
                    let name = required("--sort", args.next())?;
                    options.sort = SortCriterion::parse(&name).ok_or_else(|| {
                        AppError::InvalidArgument(format!("unknown sort '{}'", name))
                    })?;
                }
                "--out" => options.output = Some(PathBuf::from(required("--out", args.next())?)),
                flag if flag.starts_with('-') => {
                    return Err(AppError::InvalidArgument(format!("unknown option '{}'", flag)));
                }
                _ => {
                    let path = PathBuf::from(arg);
                    if !file_utils::is_supported_data_file(&path) {
                        log::warn!("{} does not look like a Parquet file", path.display());
                    }
                    options.file = Some(path);
                }
            }
        }

        Ok(options)
    }
}

fn required(flag: &str, value: Option<OsString>) -> Result<String> {
    value
        .map(|v| v.to_string_lossy().into_owned())
        .ok_or_else(|| AppError::InvalidArgument(format!("{} needs a value", flag)))
}

fn parse_count(flag: &str, value: Option<OsString>, max: usize) -> Result<usize> {
    let value = required(flag, value)?;
    match value.parse::<usize>() {
        Ok(n) if n > 0 && n <= max => Ok(n),
        Ok(n) if n > max => Err(AppError::InvalidArgument(format!(
            "{} accepts at most {}, got {}",
            flag, max, n
        ))),
        _ => Err(AppError::InvalidArgument(format!(
            "{} expects a positive number, got '{}'",
            flag, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<StartupOptions> {
        StartupOptions::parse(args.iter().map(OsString::from))
    }

    #[test]
    fn defaults_without_arguments() {
        let options = parse(&[]).unwrap();
        assert_eq!(options, StartupOptions::default());
        assert_eq!(options.page, 1);
    }

    #[test]
    fn parses_every_option() {
        let options = parse(&[
            "data.parquet",
            "--page",
            "3",
            "--search",
            "fox",
            "--sort",
            "recent",
            "--columns",
            "4",
            "--page-size",
            "20",
            "--out",
            "sheet.png",
        ])
        .unwrap();

        assert_eq!(options.file, Some(PathBuf::from("data.parquet")));
        assert_eq!(options.page, 3);
        assert_eq!(options.search.as_deref(), Some("fox"));
        assert_eq!(options.sort, SortCriterion::RecencyDesc);
        assert_eq!(options.columns, Some(4));
        assert_eq!(options.page_size, Some(20));
        assert_eq!(options.output, Some(PathBuf::from("sheet.png")));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(parse(&["--page", "0"]), Err(AppError::InvalidArgument(_))));
        assert!(matches!(parse(&["--page"]), Err(AppError::InvalidArgument(_))));
        assert!(matches!(parse(&["--sort", "size"]), Err(AppError::InvalidArgument(_))));
        assert!(matches!(parse(&["--verbose"]), Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn caps_grid_dimensions() {
        let columns = MAX_COLUMNS_PER_ROW.to_string();
        assert_eq!(
            parse(&["--columns", &columns]).unwrap().columns,
            Some(MAX_COLUMNS_PER_ROW)
        );
        assert!(matches!(
            parse(&["--columns", "4294967297"]),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse(&["--page-size", "1001"]),
            Err(AppError::InvalidArgument(_))
        ));
    }
}
