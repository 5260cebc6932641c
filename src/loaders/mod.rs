pub use self::csv_loader::CsvLoader;
pub use self::loader::Loader;

mod csv_loader;
mod loader;
