/// Run-time switches set from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Hides the banner printed before any table.
    pub no_banner: bool,
    /// 0 prints everything, 1 drops headers and separators, 2 prints only the summary line.
    pub quiet: u8,
    /// Folds sources through a rayon reduce tree instead of the single-writer loop.
    ///
    /// Both produce the same hosts.
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            no_banner: false,
            quiet: 0,
            parallel: true,
        }
    }
}
