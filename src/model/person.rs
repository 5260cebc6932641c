use eyre::{Result, ensure};
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    Student,
    Staff,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Kind::Student => write!(f, "Student"),
            Kind::Staff => write!(f, "Staff"),
        }
    }
}

/// Payload carried by a person on top of the shared identity fields.
pub trait Role: Clone + fmt::Debug {
    const KIND: Kind;

    /// Role-specific suffix of the display label.
    fn describe(&self) -> String;
}

#[derive(Clone, Debug, PartialEq)]
pub struct StudentRole {
    major: String,
    performance_score: f64,
}

impl Role for StudentRole {
    const KIND: Kind = Kind::Student;

    fn describe(&self) -> String {
        format!(
            " | Major: {} | Score: {:?}",
            self.major, self.performance_score
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StaffRole {
    department: String,
}

impl Role for StaffRole {
    const KIND: Kind = Kind::Staff;

    fn describe(&self) -> String {
        format!(" | Dept: {}", self.department)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Person<R> {
    id: String,
    name: String,
    age: u32,
    role: R,
}

pub type Student = Person<StudentRole>;
pub type Staff = Person<StaffRole>;

impl<R: Role> Person<R> {
    fn with_role(id: &str, name: &str, age: u32, role: R) -> Result<Self> {
        let (id, name) = (id.trim(), name.trim());
        ensure!(!id.is_empty(), "{} id cannot be empty", R::KIND);
        ensure!(!name.is_empty(), "{} name cannot be empty", R::KIND);
        Ok(Person {
            id: id.to_owned(),
            name: name.to_owned(),
            age,
            role,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn kind(&self) -> Kind {
        R::KIND
    }

    /// Rename, ignoring names which are blank once trimmed.
    pub fn set_name(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.name = name.to_owned();
        }
    }

    pub fn set_age(&mut self, age: u32) {
        self.age = age;
    }

    pub fn display_label(&self) -> String {
        format!(
            "{} | {} | Age: {} | Type: {}{}",
            self.id,
            self.name,
            self.age,
            R::KIND,
            self.role.describe()
        )
    }
}

impl<R: Role> fmt::Display for Person<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display_label())
    }
}

impl Student {
    pub fn new(id: &str, name: &str, age: u32, major: &str, performance_score: f64) -> Result<Self> {
        Self::with_role(
            id,
            name,
            age,
            StudentRole {
                major: major.trim().to_owned(),
                performance_score: performance_score.max(0.0),
            },
        )
    }

    pub fn major(&self) -> &str {
        &self.role.major
    }

    pub fn set_major(&mut self, major: &str) {
        self.role.major = major.trim().to_owned();
    }

    pub fn performance_score(&self) -> f64 {
        self.role.performance_score
    }

    /// Negative (and NaN) scores are stored as zero.
    pub fn set_performance_score(&mut self, score: f64) {
        self.role.performance_score = score.max(0.0);
    }

    pub fn reward(&mut self, amount: f64) -> f64 {
        self.set_performance_score(self.performance_score() + amount);
        self.performance_score()
    }

    pub fn penalize(&mut self, amount: f64) -> f64 {
        self.set_performance_score(self.performance_score() - amount);
        self.performance_score()
    }
}

impl Staff {
    pub const UNKNOWN_DEPARTMENT: &'static str = "Unknown";

    pub fn new(id: &str, name: &str, age: u32, department: &str) -> Result<Self> {
        Self::with_role(
            id,
            name,
            age,
            StaffRole {
                department: Self::department_or_default(department),
            },
        )
    }

    fn department_or_default(department: &str) -> String {
        match department.trim() {
            "" => Self::UNKNOWN_DEPARTMENT.to_owned(),
            department => department.to_owned(),
        }
    }

    pub fn department(&self) -> &str {
        &self.role.department
    }

    pub fn set_department(&mut self, department: &str) {
        self.role.department = Self::department_or_default(department);
    }
}

/// A student or a staff member, for code handling both uniformly.
#[derive(Clone, Copy, Debug)]
pub enum Member<'a> {
    Student(&'a Student),
    Staff(&'a Staff),
}

impl Member<'_> {
    pub fn id(&self) -> &str {
        match self {
            Member::Student(s) => s.id(),
            Member::Staff(s) => s.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Member::Student(s) => s.name(),
            Member::Staff(s) => s.name(),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Member::Student(s) => s.kind(),
            Member::Staff(s) => s.kind(),
        }
    }

    pub fn display_label(&self) -> String {
        match self {
            Member::Student(s) => s.display_label(),
            Member::Staff(s) => s.display_label(),
        }
    }
}

impl<'a> From<&'a Student> for Member<'a> {
    fn from(student: &'a Student) -> Self {
        Member::Student(student)
    }
}

impl<'a> From<&'a Staff> for Member<'a> {
    fn from(staff: &'a Staff) -> Self {
        Member::Staff(staff)
    }
}
