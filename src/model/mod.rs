pub use self::change::{Change, CourseUpdate, StaffUpdate, StudentUpdate};
pub use self::course::{Course, Enrollment};
pub use self::person::{Member, Staff, Student};
pub use self::registry::{CourseOrder, Registry, StaffOrder, StudentOrder};

mod change;
mod course;
mod person;
mod registry;

/// Identifiers are compared without regard to case everywhere.
pub fn same_id(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
