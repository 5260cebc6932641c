use crate::display::{
    display_courses, display_enrollments, display_members, display_staff, display_student_details,
    display_students,
};
use crate::evaluation::{EvaluationQueue, penalize, reward};
use crate::model::{
    Change, Course, CourseOrder, CourseUpdate, Registry, Staff, StaffOrder, StaffUpdate, Student,
    StudentOrder, StudentUpdate,
};
use clap::Subcommand;
use eyre::{Result, bail, ensure};
use std::io::Write;
use tracing::{debug, warn};

/// Operations run once against the stored data.
#[derive(Debug, Subcommand)]
pub enum Operation {
    /// List students
    Students {
        #[arg(short, long, value_enum)]
        sort: Option<StudentOrder>,
    },
    /// List staff members
    Staff {
        #[arg(short, long, value_enum)]
        sort: Option<StaffOrder>,
    },
    /// List courses and their enrolled students
    Courses {
        #[arg(short, long, value_enum)]
        sort: Option<CourseOrder>,
    },
    /// List students then staff members
    Members,
    /// List every (student, course) enrollment
    Enrollments,
    /// Find a student or a staff member by id
    Find { id: String },
    /// Find a student by id, or students by exact name
    FindStudent {
        #[arg(long, required_unless_present = "name", conflicts_with = "name")]
        id: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    AddStudent {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 0)]
        age: u32,
        #[arg(long, default_value = "")]
        major: String,
        #[arg(long, default_value_t = 0.0)]
        score: f64,
    },
    AddStaff {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 18)]
        age: u32,
        #[arg(long, default_value = "")]
        department: String,
    },
    AddCourse {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 1)]
        capacity: u32,
        /// Staff id of the instructor, which does not need to exist yet
        #[arg(long)]
        instructor: Option<String>,
    },
    /// Change the given fields of a student, keeping the others
    UpdateStudent {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        major: Option<String>,
    },
    /// Change the given fields of a staff member, keeping the others
    UpdateStaff {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        department: Option<String>,
    },
    /// Change the given fields of a course, keeping the others and its enrollment
    UpdateCourse {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        capacity: Option<u32>,
        #[arg(long, conflicts_with = "no_instructor")]
        instructor: Option<String>,
        /// Remove the instructor
        #[arg(long)]
        no_instructor: bool,
    },
    /// Delete a student and withdraw them from every course
    DeleteStudent { id: String },
    DeleteStaff { id: String },
    DeleteCourse { id: String },
    /// Enroll a student into a course
    Enroll { student: String, course: String },
    /// Remove a student from a course
    Unenroll { student: String, course: String },
    /// Raise a student's performance score
    Reward {
        student: String,
        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },
    /// Lower a student's performance score, never below zero
    Penalize {
        student: String,
        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },
    /// Queue evaluation commands such as "R,S001,5" or "P,S001,2.5" and
    /// process them in order
    Evaluate {
        #[arg(required = true)]
        commands: Vec<String>,
    },
}

impl Operation {
    /// Run the operation, and tell whether the registry has been modified.
    pub fn run(self, registry: &mut Registry, out: &mut impl Write) -> Result<bool> {
        match self {
            Operation::Students { sort } => {
                let students = match sort {
                    Some(order) => registry.students_sorted(order),
                    None => registry.students().iter().collect(),
                };
                display_students(out, &students)?;
                Ok(false)
            }
            Operation::Staff { sort } => {
                let staff = match sort {
                    Some(order) => registry.staff_sorted(order),
                    None => registry.staff().iter().collect(),
                };
                display_staff(out, &staff)?;
                Ok(false)
            }
            Operation::Courses { sort } => {
                let courses = match sort {
                    Some(order) => registry.courses_sorted(order),
                    None => registry.courses().iter().collect(),
                };
                display_courses(out, registry, &courses)?;
                Ok(false)
            }
            Operation::Members => {
                display_members(out, registry.members())?;
                Ok(false)
            }
            Operation::Enrollments => {
                display_enrollments(out, registry)?;
                Ok(false)
            }
            Operation::Find { id } => {
                let Some(member) = registry.find_member(&id) else {
                    bail!("no student or staff member with id {id}");
                };
                debug!(kind = %member.kind(), id = member.id(), name = member.name(), "member found");
                writeln!(out, "{}", member.display_label())?;
                Ok(false)
            }
            Operation::FindStudent { id, name } => {
                if let Some(id) = id {
                    let Some(student) = registry.find_student(&id) else {
                        bail!("student {id} not found");
                    };
                    display_student_details(out, registry, student)?;
                } else if let Some(name) = name {
                    let found = registry.find_students_by_name(&name);
                    ensure!(!found.is_empty(), "no student named {name}");
                    display_students(out, &found)?;
                }
                Ok(false)
            }
            Operation::AddStudent {
                id,
                name,
                age,
                major,
                score,
            } => {
                ensure!(
                    registry.find_student(&id).is_none(),
                    "student {id} already exists"
                );
                let student = Student::new(&id, &name, age, &major, score)?;
                writeln!(out, "Student added: {student}")?;
                registry.add_student(student);
                Ok(true)
            }
            Operation::AddStaff {
                id,
                name,
                age,
                department,
            } => {
                ensure!(
                    registry.find_staff(&id).is_none(),
                    "staff {id} already exists"
                );
                let staff = Staff::new(&id, &name, age, &department)?;
                writeln!(out, "Staff added: {staff}")?;
                registry.add_staff(staff);
                Ok(true)
            }
            Operation::AddCourse {
                id,
                name,
                capacity,
                instructor,
            } => {
                ensure!(
                    registry.find_course(&id).is_none(),
                    "course {id} already exists"
                );
                let course = Course::new(&id, &name, capacity, instructor.as_deref())?;
                if let Some(instructor) = course.instructor_id() {
                    if registry.find_staff(instructor).is_none() {
                        warn!(%instructor, "instructor is not a known staff member");
                    }
                }
                writeln!(out, "Course added: {course}")?;
                registry.add_course(course);
                Ok(true)
            }
            Operation::UpdateStudent {
                id,
                name,
                age,
                major,
            } => {
                let update = StudentUpdate {
                    name: name.into(),
                    age: age.into(),
                    major: major.into(),
                };
                ensure!(
                    registry.update_student(&id, update),
                    "student {id} not found"
                );
                Ok(true)
            }
            Operation::UpdateStaff {
                id,
                name,
                age,
                department,
            } => {
                let update = StaffUpdate {
                    name: name.into(),
                    age: age.into(),
                    department: department.into(),
                };
                ensure!(registry.update_staff(&id, update), "staff {id} not found");
                Ok(true)
            }
            Operation::UpdateCourse {
                id,
                name,
                capacity,
                instructor,
                no_instructor,
            } => {
                let instructor_id = if no_instructor {
                    Change::Set(None)
                } else {
                    instructor.map(Some).into()
                };
                let update = CourseUpdate {
                    name: name.into(),
                    capacity: capacity.into(),
                    instructor_id,
                };
                if update.is_empty() {
                    return Ok(false);
                }
                let Some(course) = registry.find_course(&id) else {
                    bail!("course {id} not found");
                };
                let enrolled = course.enrolled_count();
                ensure!(
                    registry.update_course(&id, update),
                    "course {id} has {enrolled} enrolled students, more than the requested capacity"
                );
                Ok(true)
            }
            Operation::DeleteStudent { id } => {
                ensure!(registry.delete_student(&id), "student {id} not found");
                Ok(true)
            }
            Operation::DeleteStaff { id } => {
                ensure!(registry.delete_staff(&id), "staff {id} not found");
                Ok(true)
            }
            Operation::DeleteCourse { id } => {
                ensure!(registry.delete_course(&id), "course {id} not found");
                Ok(true)
            }
            Operation::Enroll { student, course } => {
                let Some(student) = registry.find_student(&student).map(|s| s.id().to_owned())
                else {
                    bail!("student {} not found", student.trim());
                };
                let Some(c) = registry.find_course(&course) else {
                    bail!("course {} not found", course.trim());
                };
                let course = c.id().to_owned();
                ensure!(!c.is_enrolled(&student), "student {student} already enrolled in {course}");
                ensure!(!c.is_full(), "course {course} is full");
                ensure!(
                    registry.enroll_student_in_course(&student, &course),
                    "cannot enroll {student} into {course}"
                );
                Ok(true)
            }
            Operation::Unenroll { student, course } => {
                ensure!(
                    registry.remove_student_from_course(&student, &course),
                    "student {student} is not enrolled in course {course}"
                );
                Ok(true)
            }
            Operation::Reward { student, amount } => {
                ensure!(amount.is_finite(), "invalid amount {amount}");
                ensure!(
                    registry.find_student(&student).is_some(),
                    "student {student} not found"
                );
                writeln!(out, "{}", reward(registry, &student, amount))?;
                Ok(true)
            }
            Operation::Penalize { student, amount } => {
                ensure!(amount.is_finite(), "invalid amount {amount}");
                ensure!(
                    registry.find_student(&student).is_some(),
                    "student {student} not found"
                );
                writeln!(out, "{}", penalize(registry, &student, amount))?;
                Ok(true)
            }
            Operation::Evaluate { commands } => {
                let mut queue = EvaluationQueue::new();
                for command in commands {
                    queue.schedule(command);
                }
                let mut applied = false;
                for outcome in queue.process_all(registry) {
                    writeln!(out, "{outcome}")?;
                    applied |= outcome.is_applied();
                }
                Ok(applied)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        let mut r = Registry::new();
        r.add_student(Student::new("S1", "Ada", 20, "Maths", 10.0).unwrap());
        r.add_student(Student::new("S2", "Grace", 22, "Physics", 4.0).unwrap());
        r.add_course(Course::new("C1", "Algebra", 1, None).unwrap());
        r
    }

    fn run(r: &mut Registry, op: Operation) -> Result<(bool, String)> {
        let mut out = Vec::new();
        let modified = op.run(r, &mut out)?;
        Ok((modified, String::from_utf8(out).unwrap()))
    }

    #[test]
    fn test_listing_does_not_modify() {
        let mut r = registry();
        let (modified, out) = run(
            &mut r,
            Operation::Students {
                sort: Some(StudentOrder::Score),
            },
        )
        .unwrap();
        assert!(!modified);
        assert!(out.starts_with("S1 | Ada"));
    }

    #[test]
    fn test_find_member() {
        let mut r = registry();
        r.add_staff(Staff::new("T1", "Alan", 41, "Computing").unwrap());
        let find = |id: &str| Operation::Find { id: id.to_owned() };
        let (_, out) = run(&mut r, find("t1")).unwrap();
        assert_eq!(out, "T1 | Alan | Age: 41 | Type: Staff | Dept: Computing\n");
        assert!(run(&mut r, find("X9")).is_err());
    }

    #[test]
    fn test_add_existing_is_an_error() {
        let mut r = registry();
        let op = Operation::AddStudent {
            id: "s1".to_owned(),
            name: "Other".to_owned(),
            age: 1,
            major: String::new(),
            score: 0.0,
        };
        assert!(run(&mut r, op).is_err());
    }

    #[test]
    fn test_enroll_reports_reason() {
        let mut r = registry();
        let enroll = |s: &str| Operation::Enroll {
            student: s.to_owned(),
            course: "C1".to_owned(),
        };
        assert!(run(&mut r, enroll("S1")).unwrap().0);
        let err = run(&mut r, enroll("S1")).unwrap_err();
        assert!(err.to_string().contains("already enrolled"));
        let err = run(&mut r, enroll("S2")).unwrap_err();
        assert!(err.to_string().contains("is full"));
        let err = run(&mut r, enroll("S3")).unwrap_err();
        assert!(err.to_string().contains("not found"));
        let err = run(&mut r, enroll(" s1 ")).unwrap_err();
        assert_eq!(err.to_string(), "student S1 already enrolled in C1");
    }

    #[test]
    fn test_update_course_capacity() {
        let mut r = registry();
        assert!(r.enroll_student_in_course("S1", "C1"));
        let op = |capacity| Operation::UpdateCourse {
            id: "C1".to_owned(),
            name: None,
            capacity: Some(capacity),
            instructor: None,
            no_instructor: false,
        };
        assert!(run(&mut r, op(3)).unwrap().0);
        assert_eq!(r.find_course("C1").unwrap().capacity(), 3);
        assert!(r.enroll_student_in_course("S2", "C1"));
        assert!(run(&mut r, op(1)).is_err());
    }

    #[test]
    fn test_evaluate() {
        let mut r = registry();
        let op = Operation::Evaluate {
            commands: vec!["R,S1,5".to_owned(), "P,S2,10".to_owned(), "R,S1".to_owned()],
        };
        let (modified, out) = run(&mut r, op).unwrap();
        assert!(modified);
        assert_eq!(
            out,
            "Rewarded S1 by 5.0. New score: 15.0\n\
             Penalized S2 by 10.0. New score: 0.0\n\
             Malformed evaluation command: R,S1\n"
        );
    }

    #[test]
    fn test_evaluate_without_valid_command_does_not_modify() {
        let mut r = registry();
        let op = Operation::Evaluate {
            commands: vec!["R,S1".to_owned(), "P,S9,1".to_owned(), "R,S2,much".to_owned()],
        };
        let (modified, out) = run(&mut r, op).unwrap();
        assert!(!modified);
        assert_eq!(out.lines().count(), 3);
        assert_eq!(r.find_student("S1").unwrap().performance_score(), 10.0);
    }

    #[test]
    fn test_update_student_keeps_other_fields() {
        let mut r = registry();
        let op = Operation::UpdateStudent {
            id: "S1".to_owned(),
            name: None,
            age: None,
            major: Some("Biology".to_owned()),
        };
        assert!(run(&mut r, op).unwrap().0);
        let s = r.find_student("S1").unwrap();
        assert_eq!((s.name(), s.age(), s.major()), ("Ada", 20, "Biology"));
    }
}
