use crate::display::{
    display_courses, display_queue, display_staff, display_student_details, display_students,
};
use crate::evaluation::{Action, EvaluationQueue, NO_EVALUATIONS, Outcome, apply_now};
use crate::loaders::Loader;
use crate::model::{
    Change, Course, CourseOrder, CourseUpdate, Registry, Staff, StaffOrder, Student,
    StudentOrder, StudentUpdate,
};
use eyre::Result;
use std::fmt::Display;
use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::{error, info};

const MENU: &str = "\
MAIN MENU:
1. Add student
2. Add staff
3. View all students
4. View all staff
5. Search student (by ID or Name)
6. Update student
7. Delete student
8. Add course
9. View courses (and enrolled students)
10. Enroll student into course
11. Remove student from course
12. Immediate evaluation (Reward/Penalty)
13. Schedule evaluation (add to queue)
14. Process next scheduled evaluation
15. Process all scheduled evaluations
16. View scheduled evaluations queue
17. Save now
18. Update course
19. Delete course
0. Save & Exit
";

const MAX_SCORE: f64 = 1_000_000.0;

/// Interactive text menu over a registry. Every choice which modifies the
/// registry is followed by a save through the loader, if any.
pub struct Menu<'a, R, W> {
    registry: &'a mut Registry,
    queue: EvaluationQueue,
    loader: Option<&'a dyn Loader>,
    input: R,
    out: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(
        registry: &'a mut Registry,
        loader: Option<&'a dyn Loader>,
        input: R,
        out: W,
    ) -> Menu<'a, R, W> {
        Menu {
            registry,
            queue: EvaluationQueue::new(),
            loader,
            input,
            out,
        }
    }

    /// Run until the user exits or the input is exhausted.
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.out, "======================================")?;
        writeln!(self.out, "Student & Course Management System")?;
        writeln!(self.out, "======================================")?;
        writeln!(self.out)?;
        loop {
            write!(self.out, "{MENU}")?;
            let Some(choice) = self.prompt("Enter choice: ")? else {
                self.save()?;
                writeln!(self.out, "Saved. Exiting. Goodbye!")?;
                return Ok(());
            };
            let modified = match choice.as_str() {
                "0" => {
                    self.save()?;
                    writeln!(self.out, "Saved. Exiting. Goodbye!")?;
                    return Ok(());
                }
                "1" => self.add_student()?,
                "2" => self.add_staff()?,
                "3" => self.view_students()?,
                "4" => self.view_staff()?,
                "5" => self.search_student()?,
                "6" => self.update_student()?,
                "7" => self.delete_student()?,
                "8" => self.add_course()?,
                "9" => self.view_courses()?,
                "10" => self.enroll()?,
                "11" => self.remove_enrollment()?,
                "12" => self.immediate_evaluation()?,
                "13" => self.schedule_evaluation()?,
                "14" => {
                    let outcome = self.queue.process_next(self.registry);
                    writeln!(self.out, "{outcome}")?;
                    outcome.is_applied()
                }
                "15" => {
                    let results = self.queue.process_all(self.registry);
                    if results.is_empty() {
                        writeln!(self.out, "{NO_EVALUATIONS}")?;
                    }
                    for r in &results {
                        writeln!(self.out, "{r}")?;
                    }
                    results.iter().any(Outcome::is_applied)
                }
                "16" => {
                    display_queue(&mut self.out, &self.queue)?;
                    false
                }
                "17" => {
                    self.save()?;
                    writeln!(self.out, "Data saved.")?;
                    false
                }
                "18" => self.update_course()?,
                "19" => self.delete_course()?,
                _ => {
                    writeln!(
                        self.out,
                        "Invalid option. Please enter a number from the menu."
                    )?;
                    false
                }
            };
            if modified {
                self.save()?;
            }
            writeln!(self.out)?;
        }
    }

    fn save(&mut self) -> Result<()> {
        let Some(loader) = self.loader else {
            return Ok(());
        };
        if let Err(e) = loader.save(self.registry) {
            error!("{e:#}");
            writeln!(self.out, "Error saving data: {e:#}")?;
        } else {
            info!("data saved");
        }
        Ok(())
    }

    /// Read one trimmed line, or `None` at end of input.
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.out, "{text}")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    /// Ask until a number in `min..=max` is given. A blank answer yields
    /// `blank`.
    fn prompt_number<T>(&mut self, text: &str, min: T, max: T, blank: T) -> Result<Option<T>>
    where
        T: FromStr + PartialOrd + Display + Copy,
    {
        loop {
            let Some(answer) = self.prompt(text)? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(Some(blank));
            }
            match answer.parse::<T>() {
                Ok(n) if n >= min && n <= max => return Ok(Some(n)),
                Ok(_) => writeln!(self.out, "Please enter a number between {min} and {max}.")?,
                Err(_) => writeln!(self.out, "Please enter a valid number.")?,
            }
        }
    }

    fn add_student(&mut self) -> Result<bool> {
        writeln!(self.out, "--- Add Student ---")?;
        let Some(id) = self.prompt("Enter student ID: ")? else {
            return Ok(false);
        };
        if id.is_empty() {
            writeln!(self.out, "ID cannot be empty.")?;
            return Ok(false);
        }
        if self.registry.find_student(&id).is_some() {
            writeln!(self.out, "Student ID already exists.")?;
            return Ok(false);
        }
        let Some(name) = self.prompt("Enter full name: ")? else {
            return Ok(false);
        };
        if name.is_empty() {
            writeln!(self.out, "Name cannot be empty.")?;
            return Ok(false);
        }
        let Some(age) = self.prompt_number("Enter age (integer): ", 0, 200, 0)? else {
            return Ok(false);
        };
        let Some(major) = self.prompt("Enter major (optional): ")? else {
            return Ok(false);
        };
        let Some(score) = self.prompt_number(
            "Enter initial performance score (or blank = 0): ",
            0.0,
            MAX_SCORE,
            0.0,
        )?
        else {
            return Ok(false);
        };
        let student = Student::new(&id, &name, age, &major, score)?;
        writeln!(self.out, "Student added: {student}")?;
        self.registry.add_student(student);
        Ok(true)
    }

    fn add_staff(&mut self) -> Result<bool> {
        writeln!(self.out, "--- Add Staff ---")?;
        let Some(id) = self.prompt("Enter staff ID: ")? else {
            return Ok(false);
        };
        if id.is_empty() {
            writeln!(self.out, "ID cannot be empty.")?;
            return Ok(false);
        }
        if self.registry.find_staff(&id).is_some() {
            writeln!(self.out, "Staff ID already exists.")?;
            return Ok(false);
        }
        let Some(name) = self.prompt("Enter full name: ")? else {
            return Ok(false);
        };
        if name.is_empty() {
            writeln!(self.out, "Name cannot be empty.")?;
            return Ok(false);
        }
        let Some(age) = self.prompt_number("Enter age (integer): ", 18, 120, 18)? else {
            return Ok(false);
        };
        let Some(department) = self.prompt("Enter department/role: ")? else {
            return Ok(false);
        };
        let staff = Staff::new(&id, &name, age, &department)?;
        writeln!(self.out, "Staff added: {staff}")?;
        self.registry.add_staff(staff);
        Ok(true)
    }

    fn view_students(&mut self) -> Result<bool> {
        if self.registry.students().is_empty() {
            writeln!(self.out, "No students found.")?;
            return Ok(false);
        }
        writeln!(self.out, "--- VIEW STUDENTS ---")?;
        writeln!(self.out, "1. Sort by ID")?;
        writeln!(self.out, "2. Sort by Name")?;
        writeln!(self.out, "3. Sort by Performance Score")?;
        writeln!(self.out, "4. No sorting")?;
        let Some(choice) = self.prompt("Choose option: ")? else {
            return Ok(false);
        };
        let order = match choice.as_str() {
            "1" => Some(StudentOrder::Id),
            "2" => Some(StudentOrder::Name),
            "3" => Some(StudentOrder::Score),
            "4" => None,
            _ => {
                writeln!(self.out, "Invalid choice. Showing unsorted list.")?;
                None
            }
        };
        let students = match order {
            Some(order) => self.registry.students_sorted(order),
            None => self.registry.students().iter().collect(),
        };
        writeln!(self.out, "--- STUDENT LIST ---")?;
        display_students(&mut self.out, &students)?;
        Ok(false)
    }

    fn view_staff(&mut self) -> Result<bool> {
        if self.registry.staff().is_empty() {
            writeln!(self.out, "No staff found.")?;
            return Ok(false);
        }
        writeln!(self.out, "--- VIEW STAFF ---")?;
        writeln!(self.out, "1. Sort by Staff ID")?;
        writeln!(self.out, "2. Sort by Name")?;
        writeln!(self.out, "3. Sort by Department")?;
        writeln!(self.out, "4. No sorting")?;
        let Some(choice) = self.prompt("Choose option: ")? else {
            return Ok(false);
        };
        let order = match choice.as_str() {
            "1" => Some(StaffOrder::Id),
            "2" => Some(StaffOrder::Name),
            "3" => Some(StaffOrder::Department),
            "4" => None,
            _ => {
                writeln!(self.out, "Invalid choice. Showing unsorted list.")?;
                None
            }
        };
        let staff = match order {
            Some(order) => self.registry.staff_sorted(order),
            None => self.registry.staff().iter().collect(),
        };
        writeln!(self.out, "--- STAFF LIST ---")?;
        display_staff(&mut self.out, &staff)?;
        Ok(false)
    }

    fn view_courses(&mut self) -> Result<bool> {
        if self.registry.courses().is_empty() {
            writeln!(self.out, "No courses found.")?;
            return Ok(false);
        }
        writeln!(self.out, "--- VIEW COURSES ---")?;
        writeln!(self.out, "1. Sort by Course ID")?;
        writeln!(self.out, "2. Sort by Course Name")?;
        writeln!(self.out, "3. Sort by Enrolled Student Count")?;
        writeln!(self.out, "4. No sorting")?;
        let Some(choice) = self.prompt("Choose option: ")? else {
            return Ok(false);
        };
        let order = match choice.as_str() {
            "1" => Some(CourseOrder::Id),
            "2" => Some(CourseOrder::Name),
            "3" => Some(CourseOrder::Enrollment),
            "4" => None,
            _ => {
                writeln!(self.out, "Invalid choice. Showing unsorted list.")?;
                None
            }
        };
        let courses = match order {
            Some(order) => self.registry.courses_sorted(order),
            None => self.registry.courses().iter().collect(),
        };
        writeln!(self.out, "--- COURSE LIST ---")?;
        display_courses(&mut self.out, self.registry, &courses)?;
        Ok(false)
    }

    fn search_student(&mut self) -> Result<bool> {
        writeln!(self.out, "--- Search Student ---")?;
        writeln!(self.out, "1. Search by ID")?;
        writeln!(self.out, "2. Search by Name")?;
        let Some(option) = self.prompt("Enter option: ")? else {
            return Ok(false);
        };
        match option.as_str() {
            "1" => {
                let Some(id) = self.prompt("Enter student ID: ")? else {
                    return Ok(false);
                };
                match self.registry.find_student(&id) {
                    Some(s) => display_student_details(&mut self.out, self.registry, s)?,
                    None => writeln!(self.out, "Student not found.")?,
                }
            }
            "2" => {
                let Some(name) = self.prompt("Enter student name (exact match): ")? else {
                    return Ok(false);
                };
                let found = self.registry.find_students_by_name(&name);
                if found.is_empty() {
                    writeln!(self.out, "No students found with that name.")?;
                } else {
                    display_students(&mut self.out, &found)?;
                }
            }
            _ => writeln!(self.out, "Invalid search option.")?,
        }
        Ok(false)
    }

    fn update_student(&mut self) -> Result<bool> {
        writeln!(self.out, "--- Update Student ---")?;
        let Some(id) = self.prompt("Enter student ID to update: ")? else {
            return Ok(false);
        };
        let Some(current) = self.registry.find_student(&id) else {
            writeln!(self.out, "Student not found.")?;
            return Ok(false);
        };
        writeln!(self.out, "Current: {current}")?;
        let Some(name) = self.prompt("Enter new name (leave blank to keep): ")? else {
            return Ok(false);
        };
        let Some(age) = self.prompt("Enter new age (leave blank to keep): ")? else {
            return Ok(false);
        };
        let age = match age.as_str() {
            "" => Change::Keep,
            age => match age.parse::<u32>() {
                Ok(age) => Change::Set(age),
                Err(_) => {
                    writeln!(self.out, "Invalid age. Update aborted.")?;
                    return Ok(false);
                }
            },
        };
        let Some(major) = self.prompt("Enter new major (leave blank to keep): ")? else {
            return Ok(false);
        };
        let update = StudentUpdate {
            name: Change::from_input(&name),
            age,
            major: Change::from_input(&major),
        };
        let updated = self.registry.update_student(&id, update);
        writeln!(
            self.out,
            "{}",
            if updated {
                "Student updated."
            } else {
                "Update failed."
            }
        )?;
        Ok(updated)
    }

    fn delete_student(&mut self) -> Result<bool> {
        writeln!(self.out, "--- Delete Student ---")?;
        let Some(id) = self.prompt("Enter student ID to delete: ")? else {
            return Ok(false);
        };
        if id.is_empty() {
            writeln!(self.out, "ID cannot be empty.")?;
            return Ok(false);
        }
        let deleted = self.registry.delete_student(&id);
        writeln!(
            self.out,
            "{}",
            if deleted {
                "Student deleted."
            } else {
                "Student not found or deletion failed."
            }
        )?;
        Ok(deleted)
    }

    fn add_course(&mut self) -> Result<bool> {
        writeln!(self.out, "--- Add Course ---")?;
        let Some(id) = self.prompt("Enter course ID: ")? else {
            return Ok(false);
        };
        if id.is_empty() {
            writeln!(self.out, "Course ID cannot be empty.")?;
            return Ok(false);
        }
        if self.registry.find_course(&id).is_some() {
            writeln!(self.out, "Course ID already exists.")?;
            return Ok(false);
        }
        let Some(name) = self.prompt("Enter course name: ")? else {
            return Ok(false);
        };
        if name.is_empty() {
            writeln!(self.out, "Course name cannot be empty.")?;
            return Ok(false);
        }
        let Some(capacity) = self.prompt_number("Enter capacity (integer): ", 1, 1000, 1)? else {
            return Ok(false);
        };
        let Some(instructor) =
            self.prompt("Enter instructor (staff) ID (leave blank if none): ")?
        else {
            return Ok(false);
        };
        if !instructor.is_empty() && self.registry.find_staff(&instructor).is_none() {
            writeln!(
                self.out,
                "Warning: instructor ID not found. You can set it later."
            )?;
        }
        let course = Course::new(&id, &name, capacity, Some(instructor.as_str()))?;
        writeln!(self.out, "Course added: {course}")?;
        self.registry.add_course(course);
        Ok(true)
    }

    fn update_course(&mut self) -> Result<bool> {
        writeln!(self.out, "--- Update Course ---")?;
        let Some(id) = self.prompt("Enter course ID to update: ")? else {
            return Ok(false);
        };
        let Some(current) = self.registry.find_course(&id) else {
            writeln!(self.out, "Course not found.")?;
            return Ok(false);
        };
        writeln!(self.out, "Current: {current}")?;
        let Some(name) = self.prompt("Enter new name (leave blank to keep): ")? else {
            return Ok(false);
        };
        let Some(capacity) = self.prompt("Enter new capacity (leave blank to keep): ")? else {
            return Ok(false);
        };
        let capacity = match capacity.as_str() {
            "" => Change::Keep,
            capacity => match capacity.parse::<u32>() {
                Ok(capacity) => Change::Set(capacity),
                Err(_) => {
                    writeln!(self.out, "Invalid capacity. Update aborted.")?;
                    return Ok(false);
                }
            },
        };
        let Some(instructor) = self.prompt(
            "Enter new instructor ID (leave blank to keep, '-' to remove): ",
        )?
        else {
            return Ok(false);
        };
        let instructor_id = match instructor.as_str() {
            "" => Change::Keep,
            "-" => Change::Set(None),
            instructor => {
                if self.registry.find_staff(instructor).is_none() {
                    writeln!(self.out, "Warning: instructor ID not found.")?;
                }
                Change::Set(Some(instructor.to_owned()))
            }
        };
        let update = CourseUpdate {
            name: Change::from_input(&name),
            capacity,
            instructor_id,
        };
        let updated = self.registry.update_course(&id, update);
        writeln!(
            self.out,
            "{}",
            if updated {
                "Course updated."
            } else {
                "Update failed. Capacity cannot be lower than the number of enrolled students."
            }
        )?;
        Ok(updated)
    }

    fn delete_course(&mut self) -> Result<bool> {
        writeln!(self.out, "--- Delete Course ---")?;
        let Some(id) = self.prompt("Enter course ID to delete: ")? else {
            return Ok(false);
        };
        let deleted = self.registry.delete_course(&id);
        writeln!(
            self.out,
            "{}",
            if deleted {
                "Course deleted."
            } else {
                "Course not found."
            }
        )?;
        Ok(deleted)
    }

    fn enroll(&mut self) -> Result<bool> {
        writeln!(self.out, "--- Enroll Student ---")?;
        let Some(student_id) = self.prompt("Enter student ID: ")? else {
            return Ok(false);
        };
        let Some(course_id) = self.prompt("Enter course ID: ")? else {
            return Ok(false);
        };
        let enrolled = self
            .registry
            .enroll_student_in_course(&student_id, &course_id);
        writeln!(
            self.out,
            "{}",
            if enrolled {
                "Enrolled successfully."
            } else {
                "Enrollment failed. Check student ID, course ID, or capacity/already enrolled."
            }
        )?;
        Ok(enrolled)
    }

    fn remove_enrollment(&mut self) -> Result<bool> {
        writeln!(self.out, "--- Remove Enrollment ---")?;
        let Some(student_id) = self.prompt("Enter student ID: ")? else {
            return Ok(false);
        };
        let Some(course_id) = self.prompt("Enter course ID: ")? else {
            return Ok(false);
        };
        let removed = self
            .registry
            .remove_student_from_course(&student_id, &course_id);
        writeln!(
            self.out,
            "{}",
            if removed {
                "Removed from course."
            } else {
                "Remove failed. Check IDs."
            }
        )?;
        Ok(removed)
    }

    fn immediate_evaluation(&mut self) -> Result<bool> {
        writeln!(self.out, "--- Immediate Evaluation (Reward/Penalty) ---")?;
        let Some(student_id) = self.prompt("Enter student ID: ")? else {
            return Ok(false);
        };
        if self.registry.find_student(&student_id).is_none() {
            writeln!(self.out, "Student not found.")?;
            return Ok(false);
        }
        let Some(code) = self.prompt("Reward (R) or Penalty (P)? ")? else {
            return Ok(false);
        };
        let Some(amount) = self.prompt("Enter amount: ")? else {
            return Ok(false);
        };
        let Some(amount) = amount.parse::<f64>().ok().filter(|a| a.is_finite()) else {
            writeln!(self.out, "Invalid amount.")?;
            return Ok(false);
        };
        let result = apply_now(self.registry, Action::from_code(&code), &student_id, amount);
        writeln!(self.out, "{result}")?;
        Ok(true)
    }

    fn schedule_evaluation(&mut self) -> Result<bool> {
        let Some(command) =
            self.prompt("Enter schedule command (R,studentId,amount) or (P,studentId,amount): ")?
        else {
            return Ok(false);
        };
        writeln!(self.out, "Scheduled: {command}")?;
        self.queue.schedule(command);
        info!(pending = self.queue.len(), "evaluation scheduled");
        Ok(false)
    }
}
