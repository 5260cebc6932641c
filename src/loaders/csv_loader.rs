use super::loader::Loader;
use crate::config::Files;
use crate::model::{Course, Registry, Staff, Student};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Trim, WriterBuilder};
use eyre::{Result, WrapErr, eyre};
use serde::Serialize;
use std::borrow::Cow;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use tracing::{info, instrument, warn};

/// Students, staff and courses stored as three comma separated files
/// without header nor quoting:
///
/// - students: `id,name,age,major,score`
/// - staff: `id,name,age,department`
/// - courses: `id,name,capacity,instructorId,studentId;studentId;...`
pub struct CsvLoader {
    students: PathBuf,
    staff: PathBuf,
    courses: PathBuf,
}

#[derive(Serialize)]
struct StudentRow<'a> {
    id: Cow<'a, str>,
    name: Cow<'a, str>,
    age: u32,
    major: Cow<'a, str>,
    score: f64,
}

#[derive(Serialize)]
struct StaffRow<'a> {
    id: Cow<'a, str>,
    name: Cow<'a, str>,
    age: u32,
    department: Cow<'a, str>,
}

#[derive(Serialize)]
struct CourseRow<'a> {
    id: Cow<'a, str>,
    name: Cow<'a, str>,
    capacity: u32,
    instructor_id: Cow<'a, str>,
    enrolled: String,
}

impl<'a> From<&'a Student> for StudentRow<'a> {
    fn from(s: &'a Student) -> Self {
        StudentRow {
            id: sanitize(s.id()),
            name: sanitize(s.name()),
            age: s.age(),
            major: sanitize(s.major()),
            score: s.performance_score(),
        }
    }
}

impl<'a> From<&'a Staff> for StaffRow<'a> {
    fn from(s: &'a Staff) -> Self {
        StaffRow {
            id: sanitize(s.id()),
            name: sanitize(s.name()),
            age: s.age(),
            department: sanitize(s.department()),
        }
    }
}

impl<'a> From<&'a Course> for CourseRow<'a> {
    fn from(c: &'a Course) -> Self {
        CourseRow {
            id: sanitize(c.id()),
            name: sanitize(c.name()),
            capacity: c.capacity(),
            instructor_id: sanitize(c.instructor_id().unwrap_or("")),
            enrolled: c
                .enrolled_student_ids()
                .iter()
                .map(|s| sanitize(s))
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}

/// Remove the characters which would break the row format. This is lossy:
/// "Smith, John" is saved as "Smith John".
fn sanitize(s: &str) -> Cow<'_, str> {
    const FORBIDDEN: [char; 4] = [',', ';', '\n', '\r'];
    if s.contains(FORBIDDEN) {
        Cow::Owned(s.replace(FORBIDDEN, ""))
    } else {
        Cow::Borrowed(s)
    }
}

/// Parse a numeric field, defaulting to zero when it is not a number.
fn number<T: FromStr + Default>(field: &str) -> T {
    field.parse().unwrap_or_default()
}

fn saturate(n: i64) -> u32 {
    u32::try_from(n.max(0)).unwrap_or(u32::MAX)
}

fn read_rows(path: &Path, what: &str, min_fields: usize) -> Result<Vec<StringRecord>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(file = %path.display(), "{what} file not found, starting with no {what}");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e).wrap_err_with(|| format!("cannot open {}", path.display())),
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(file);
    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.wrap_err_with(|| format!("cannot read {}", path.display()))?;
        let line = record.position().map_or(0, csv::Position::line);
        let record = match StringRecord::from_byte_record(record) {
            Ok(record) => record,
            Err(e) => {
                warn!(file = %path.display(), line, "replacing invalid UTF-8 in {what} row");
                e.into_byte_record()
                    .iter()
                    .map(String::from_utf8_lossy)
                    .collect()
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() < min_fields {
            warn!(
                file = %path.display(),
                line,
                row = %record.iter().collect::<Vec<_>>().join(","),
                "skipping malformed {what} row",
            );
            continue;
        }
        rows.push(record);
    }
    Ok(rows)
}

/// Replace `path` with the given rows. The rows are written to a temporary
/// file in the same directory first, so that the previous content survives
/// a failed write.
fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<usize> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).wrap_err_with(|| format!("cannot create {}", dir.display()))?;
    let file = NamedTempFile::new_in(dir)
        .wrap_err_with(|| format!("cannot create temporary file in {}", dir.display()))?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .from_writer(file);
    let mut count = 0;
    for row in rows {
        writer
            .serialize(row)
            .wrap_err_with(|| format!("cannot write {}", path.display()))?;
        count += 1;
    }
    let file = writer
        .into_inner()
        .map_err(|e| eyre!("cannot write {}: {}", path.display(), e.error()))?;
    file.persist(path)
        .wrap_err_with(|| format!("cannot replace {}", path.display()))?;
    Ok(count)
}

impl CsvLoader {
    pub fn new(students: PathBuf, staff: PathBuf, courses: PathBuf) -> CsvLoader {
        CsvLoader {
            students,
            staff,
            courses,
        }
    }

    pub fn from_files(files: &Files) -> CsvLoader {
        CsvLoader::new(
            files.students_path(),
            files.staff_path(),
            files.courses_path(),
        )
    }

    pub fn load_students(&self) -> Result<Vec<Student>> {
        let rows = read_rows(&self.students, "student", 5)?;
        Ok(rows
            .iter()
            .filter_map(|r| {
                Student::new(&r[0], &r[1], saturate(number(&r[2])), &r[3], number(&r[4]))
                    .inspect_err(|e| warn!(file = %self.students.display(), "skipping student: {e}"))
                    .ok()
            })
            .collect())
    }

    pub fn load_staff(&self) -> Result<Vec<Staff>> {
        let rows = read_rows(&self.staff, "staff", 4)?;
        Ok(rows
            .iter()
            .filter_map(|r| {
                Staff::new(&r[0], &r[1], saturate(number(&r[2])), &r[3])
                    .inspect_err(|e| warn!(file = %self.staff.display(), "skipping staff: {e}"))
                    .ok()
            })
            .collect())
    }

    /// Load courses, keeping only the enrollments which are valid for the
    /// students already present in `registry`.
    pub fn load_courses(&self, registry: &Registry) -> Result<Vec<Course>> {
        let rows = read_rows(&self.courses, "course", 4)?;
        let mut courses = Vec::with_capacity(rows.len());
        for r in &rows {
            let mut course =
                match Course::new(&r[0], &r[1], saturate(number(&r[2])), Some(&r[3])) {
                    Ok(course) => course,
                    Err(e) => {
                        warn!(file = %self.courses.display(), "skipping course: {e}");
                        continue;
                    }
                };
            let enrolled = r.get(4).unwrap_or("");
            for student_id in enrolled.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                match registry.find_student(student_id) {
                    Some(student) => {
                        if !course.enroll(student.id()) {
                            warn!(
                                course = %course.id(),
                                student = %student_id,
                                "dropping duplicate or over capacity enrollment"
                            );
                        }
                    }
                    None => warn!(
                        course = %course.id(),
                        student = %student_id,
                        "dropping enrollment of unknown student"
                    ),
                }
            }
            courses.push(course);
        }
        Ok(courses)
    }
}

impl Loader for CsvLoader {
    #[instrument(skip_all)]
    fn load(&mut self) -> Result<Registry> {
        let mut registry = Registry::new();
        for student in self.load_students().wrap_err("cannot load students")? {
            registry.add_student(student);
        }
        info!(file = %self.students.display(), count = registry.students().len(), "loaded students");
        for staff in self.load_staff().wrap_err("cannot load staff")? {
            registry.add_staff(staff);
        }
        info!(file = %self.staff.display(), count = registry.staff().len(), "loaded staff");
        for course in self
            .load_courses(&registry)
            .wrap_err("cannot load courses")?
        {
            registry.add_course(course);
        }
        info!(file = %self.courses.display(), count = registry.courses().len(), "loaded courses");
        Ok(registry)
    }

    #[instrument(skip_all)]
    fn save(&self, registry: &Registry) -> Result<()> {
        let count = write_rows(
            &self.students,
            registry.students().iter().map(StudentRow::from),
        )
        .wrap_err("cannot save students")?;
        info!(file = %self.students.display(), count, "saved students");
        let count = write_rows(&self.staff, registry.staff().iter().map(StaffRow::from))
            .wrap_err("cannot save staff")?;
        info!(file = %self.staff.display(), count, "saved staff");
        let count = write_rows(&self.courses, registry.courses().iter().map(CourseRow::from))
            .wrap_err("cannot save courses")?;
        info!(file = %self.courses.display(), count, "saved courses");
        Ok(())
    }
}
