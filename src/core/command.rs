use std::fmt;

pub const USAGE: &str = "\
Usage: artisan-sync <COMMAND> [OPTIONS]

Commands:
  add        Upload all artisans, then all reviews
  artisans   Upload artisans only
  reviews    Upload reviews only
  delete     Delete every review, then every artisan
  show       List artisans and summarize reviews

Datasets are read from ./artisans.json and ./reviews.json unless
--artisans / --reviews say otherwise. Run `artisan-sync --help` for
all options.
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `add`: artisans then reviews, one after the other.
    AddAll,
    AddArtisans,
    AddReviews,
    DeleteAll,
    Show,
    Usage,
}

impl Command {
    /// Maps the positional command token. Missing or unknown tokens select
    /// [`Command::Usage`] rather than failing.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("add") => Command::AddAll,
            Some("artisans") => Command::AddArtisans,
            Some("reviews") => Command::AddReviews,
            Some("delete") => Command::DeleteAll,
            Some("show") => Command::Show,
            _ => Command::Usage,
        }
    }

    pub fn touches_store(self) -> bool {
        !matches!(self, Command::Usage)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Command::AddAll => "add",
            Command::AddArtisans => "artisans",
            Command::AddReviews => "reviews",
            Command::DeleteAll => "delete",
            Command::Show => "show",
            Command::Usage => "usage",
        };
        f.write_str(token)
    }
}
