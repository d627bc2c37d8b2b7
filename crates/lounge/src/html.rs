use chrono::NaiveDate;
use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::agenda::{group_events_by_date, DayCell, MonthView};
use crate::auth::Access;
use crate::calendar::{self, MonthGrid, WEEKDAY_NAMES};
use crate::types::{Assignment, Event, Student};

fn layout(title: &str, access: Option<Access>, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Study Lounge | " (title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                nav.topbar {
                    a.brand href="/" { "Study Lounge" }
                    @if let Some(access) = access {
                        div.nav-links {
                            a href="/" { "Students" }
                            a href="/events" { "Events" }
                            span.role { (access.role.label()) }
                            form.inline method="post" action="/logout" {
                                button.secondary type="submit" { "Log out" }
                            }
                        }
                    }
                }
                main.container { (body) }
            }
        }
    }
}

fn error_banner(error: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = error {
            div.error { (message) }
        }
    }
}

pub fn render_login(error: Option<&str>) -> Markup {
    let body = html! {
        h1 { "Sign in" }
        (error_banner(error))
        form.card method="post" action="/login" {
            label for="code" { "Access code" }
            input #code type="password" name="code" autofocus required;
            button type="submit" { "Enter" }
        }
    };
    layout("Sign in", None, body)
}

/// Standalone page for a failed HTML request
pub fn render_error(title: &str, message: &str) -> Markup {
    let body = html! {
        h1 { (title) }
        div.error { (message) }
        p { a href="/" { "Back to students" } }
    };
    layout(title, None, body)
}

pub fn render_students(students: &[Student], access: Access) -> Markup {
    let body = html! {
        header.page-header {
            h1 { "Students" }
        }
        @if students.is_empty() {
            p.empty-state { "No students yet." }
        }
        @for student in students {
            div.student {
                div {
                    a href={"/students/" (student.id)} { strong { (student.name) } }
                    @if let Some(notes) = &student.notes {
                        div.small { (notes) }
                    }
                    (render_tags(student))
                }
                @if access.is_staff() {
                    form.inline method="post" action={"/students/" (student.id) "/delete"}
                        onsubmit="return confirm('Delete student and all assignments?');" {
                        button.danger type="submit" { "Delete" }
                    }
                }
            }
        }
        @if access.is_staff() {
            section.card {
                h3 { "Add student" }
                form.stack method="post" action="/students" {
                    input name="name" placeholder="Student name" required;
                    input name="notes" placeholder="Notes (optional)";
                    input name="strengths" placeholder="Strengths, comma separated";
                    input name="weaknesses" placeholder="Weaknesses, comma separated";
                    button type="submit" { "Add" }
                }
            }
        }
    };
    layout("Students", Some(access), body)
}

fn render_tags(student: &Student) -> Markup {
    html! {
        @if !student.strengths.is_empty() || !student.weaknesses.is_empty() {
            div.tags {
                @for tag in &student.strengths {
                    span.tag.strength { (tag) }
                }
                @for tag in &student.weaknesses {
                    span.tag.weakness { (tag) }
                }
            }
        }
    }
}

fn month_nav(base: &str, grid: &MonthGrid) -> Markup {
    let (prev_year, prev_month) = grid.previous();
    let (next_year, next_month) = grid.next();
    html! {
        div.month-nav {
            a href=(format!("{}?year={}&month={}", base, prev_year, prev_month)) { "‹ Prev" }
            form.inline method="get" action=(base) {
                select name="month" onchange="this.form.submit()" {
                    @for m in 1..=12u32 {
                        option value=(m) selected[m == grid.month] { (calendar::month_name(m)) }
                    }
                }
                input.year type="number" name="year" value=(grid.year) onchange="this.form.submit()";
            }
            a href=(format!("{}?year={}&month={}", base, next_year, next_month)) { "Next ›" }
        }
    }
}

fn weekday_header() -> Markup {
    html! {
        thead {
            tr {
                @for name in WEEKDAY_NAMES {
                    th { (name) }
                }
            }
        }
    }
}

fn assignment_class(a: &Assignment) -> String {
    if a.completed {
        format!("assignment {} completed", a.kind().css_class())
    } else {
        format!("assignment {}", a.kind().css_class())
    }
}

fn render_day(cell: &DayCell) -> Markup {
    html! {
        td {
            div.day-num { (cell.day) }
            @for event in &cell.events {
                div.event { (event.title) }
            }
            @for a in &cell.assignments {
                div class=(assignment_class(a)) {
                    label {
                        input.complete-checkbox type="checkbox" data-assign-id=(a.id) checked[a.completed];
                        div {
                            strong { (a.title) }
                            br;
                            small.small { (a.kind().label()) }
                            @if let Some(description) = &a.description {
                                div.small { (description) }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn render_month(
    view: &MonthView,
    access: Access,
    error: Option<&str>,
    today: NaiveDate,
) -> Markup {
    let student = &view.student;
    let base = format!("/students/{}", student.id);

    let body = html! {
        header.page-header {
            div {
                h1 { (student.name) }
                @if let Some(notes) = &student.notes {
                    div.small { (notes) }
                }
                (render_tags(student))
            }
            a href="/" { "⬅ Back" }
        }
        (error_banner(error))
        h2 { (view.grid.month_name()) " " (view.grid.year) }
        div.small {
            (view.pending_count()) " pending, " (view.completed_count()) " completed"
        }
        (month_nav(&base, &view.grid))
        table.calendar {
            (weekday_header())
            tbody {
                @for week in view.weeks() {
                    tr {
                        @for cell in &week {
                            @match cell {
                                Some(cell) => { (render_day(cell)) },
                                None => { td.blank {} },
                            }
                        }
                    }
                }
            }
        }
        @if access.is_staff() {
            section.card {
                h3 { "Add assignment / test" }
                form.stack method="post" action={(base) "/assignments"} {
                    input type="hidden" name="year" value=(view.grid.year);
                    input type="hidden" name="month" value=(view.grid.month);
                    input name="title" placeholder="Title (e.g. Algebra HW)" required;
                    input name="due_date" type="date" value=(today.format("%Y-%m-%d")) required;
                    select name="is_test" {
                        option value="0" { "Homework" }
                        option value="1" { "Test" }
                    }
                    input name="description" placeholder="Short description (optional)";
                    button type="submit" { "Add" }
                }
            }
            @if !view.assignments.is_empty() {
                section.card {
                    h3 { "This month" }
                    @for a in &view.assignments {
                        div.row {
                            span { (a.due_iso()) " · " (a.title) }
                            form.inline method="post" action={"/assignments/" (a.id) "/delete"} {
                                button.danger type="submit" { "Delete" }
                            }
                        }
                    }
                }
            }
        }
        script { (PreEscaped(TOGGLE_JS)) }
    };
    layout(&student.name, Some(access), body)
}

pub fn render_events(
    grid: &MonthGrid,
    events: &[Event],
    access: Access,
    error: Option<&str>,
) -> Markup {
    let by_date = group_events_by_date(events);

    let body = html! {
        header.page-header {
            h1 { "Events · " (grid.month_name()) " " (grid.year) }
        }
        (error_banner(error))
        (month_nav("/events", grid))
        table.calendar {
            (weekday_header())
            tbody {
                @for week in &grid.weeks {
                    tr {
                        @for cell in week {
                            @match (*cell).and_then(|day| grid.iso_of(day).map(|iso| (day, iso))) {
                                Some((day, iso)) => { td {
                                    div.day-num { (day) }
                                    @for event in by_date.get(&iso).map(Vec::as_slice).unwrap_or(&[]) {
                                        div.event {
                                            (event.title)
                                            @if access.is_staff() {
                                                form.inline method="post" action={"/events/" (event.id) "/delete"} {
                                                    button.link type="submit" title="Delete" { "×" }
                                                }
                                            }
                                        }
                                    }
                                } },
                                None => { td.blank {} },
                            }
                        }
                    }
                }
            }
        }
        @if access.is_staff() {
            section.card {
                h3 { "Add event" }
                form.stack method="post" action="/events" {
                    input type="hidden" name="year" value=(grid.year);
                    input type="hidden" name="month" value=(grid.month);
                    input name="title" placeholder="Event title" required;
                    input name="date" type="date" required;
                    button type="submit" { "Add" }
                }
            }
        }
    };
    layout("Events", Some(access), body)
}

const CSS: &str = r#"
body {
    font-family: Arial, Helvetica, sans-serif;
    margin: 0;
    color: #222;
    background: #fafafa;
}

.topbar {
    display: flex;
    justify-content: space-between;
    align-items: center;
    padding: 10px 24px;
    background: #1f3b57;
    color: #fff;
}

.topbar a { color: #fff; text-decoration: none; margin-right: 12px; }
.topbar .brand { font-weight: bold; font-size: 1.1em; }
.nav-links { display: flex; align-items: center; gap: 8px; }
.role { font-size: 0.8em; text-transform: uppercase; opacity: 0.8; }

.container { max-width: 1100px; margin: 20px auto; padding: 0 16px; }
.page-header { display: flex; justify-content: space-between; align-items: center; }

.student {
    padding: 10px;
    border: 1px solid #ddd;
    border-radius: 6px;
    margin: 8px 0;
    display: flex;
    justify-content: space-between;
    background: #fff;
}

.card {
    border: 1px solid #ddd;
    border-radius: 8px;
    padding: 12px;
    margin-top: 16px;
    background: #fff;
}

form.inline { display: inline-flex; gap: 8px; margin: 0; }
form.stack { display: flex; gap: 8px; flex-wrap: wrap; }

input, select, textarea { padding: 6px; border-radius: 4px; border: 1px solid #ccc; }
input.year { width: 90px; }

button { padding: 6px 10px; border-radius: 6px; border: 0; background: #007bff; color: #fff; cursor: pointer; }
button.danger { background: #dc3545; }
button.secondary { background: transparent; border: 1px solid #fff; }
button.link { background: none; color: #a00; padding: 0 4px; }

.month-nav { display: flex; gap: 12px; align-items: center; margin: 8px 0; }

.calendar { width: 100%; border-collapse: collapse; margin-top: 12px; background: #fff; }
.calendar th { padding: 8px; background: #f2f2f2; }
.calendar td { vertical-align: top; border: 1px solid #eee; padding: 6px; height: 110px; width: 14%; }
.calendar td.blank { background: #f7f7f7; }

.day-num { font-weight: bold; }
.assignment { border-radius: 6px; padding: 4px; margin-top: 4px; font-size: 0.9em; border: 1px solid #ccc; }
.assignment label { display: flex; align-items: center; gap: 8px; }
.test { background: #fff3cd; }
.homework { background: #e9f7ef; }
.completed { opacity: 0.6; text-decoration: line-through; }
.event { border-radius: 6px; padding: 2px 4px; margin-top: 4px; font-size: 0.85em; background: #e7f0fb; }

.tags { margin-top: 4px; }
.tag { display: inline-block; font-size: 0.75em; padding: 2px 6px; border-radius: 10px; margin-right: 4px; }
.tag.strength { background: #d4edda; }
.tag.weakness { background: #f8d7da; }

.row { display: flex; justify-content: space-between; padding: 4px 0; border-bottom: 1px solid #f0f0f0; }
.small { font-size: 0.9em; color: #555; }
.error { background: #f8d7da; color: #721c24; padding: 8px 12px; border-radius: 6px; margin: 8px 0; }
.empty-state { color: #666; }
"#;

const TOGGLE_JS: &str = r#"
document.querySelectorAll('.complete-checkbox').forEach(cb => {
    cb.addEventListener('change', () => {
        const id = cb.dataset.assignId;
        fetch('/assignments/' + id + '/toggle', { method: 'POST' })
            .then(r => r.json())
            .then(data => {
                if (!data.ok) {
                    alert('Could not update.');
                    cb.checked = !cb.checked;
                    return;
                }
                cb.checked = data.completed;
                const parent = cb.closest('.assignment');
                parent.classList.toggle('completed', data.completed);
            })
            .catch(() => {
                alert('Network error');
                cb.checked = !cb.checked;
            });
    });
});
"#;
