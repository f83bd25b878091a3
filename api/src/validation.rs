use std::{collections::HashMap, str::FromStr};

use bson::{Document, doc, oid::ObjectId};
use bulletin_core::db::{
    AnnouncementType,
    Event,
    EventType,
    PosterSize,
    ResourceCategory,
    Theme
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use serde::Deserialize;

use crate::error::ErrorResponse;

lazy_static::lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref USERNAME_PATTERN: Regex =
        Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap();
}

pub const DEFAULT_PAGE_LIMIT: u64 = 10;
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Collects messages and fails with all of them joined by `, `.
#[derive(Debug, Default)]
struct Problems(Vec<String>);

impl Problems {
    fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    fn finish<T>(self, value: T) -> Result<T, ErrorResponse> {
        if self.0.is_empty() {
            return Ok(value);
        }

        Err(ErrorResponse::bad_request(self.0.join(", ")))
    }
}

/// HTML-escapes user supplied text before it is stored.
pub fn escape(value: &str) -> String {
    html_escape::encode_safe(value).into_owned()
}

pub fn is_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Weak passwords use a single character class and are shorter than 16
/// characters.
pub fn is_weak_password(password: &str) -> bool {
    let classes = [
        password.chars().any(|c| c.is_lowercase()),
        password.chars().any(|c| c.is_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_alphanumeric())
    ]
    .into_iter()
    .filter(|present| *present)
    .count();

    classes < 2 && password.chars().count() < 16
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim)
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    pub name:     Option<String>,
    pub username: Option<String>,
    pub email:    Option<String>,
    pub password: Option<String>
}

#[derive(Debug, PartialEq)]
pub struct Registration {
    pub name:     String,
    pub email:    String,
    pub password: String
}

impl RegisterForm {
    pub fn validate(self) -> Result<Registration, ErrorResponse> {
        let mut problems = Problems::default();

        let name = self
            .name
            .filter(|name| !name.is_empty())
            .or(self.username)
            .map(|name| name.trim().to_string());

        match &name {
            None => problems.push("Username is required"),
            Some(name) if name.is_empty() => {
                problems.push("Username cannot be empty")
            }
            Some(name) if name.chars().count() < 3 => {
                problems.push("Username must be at least 3 characters long")
            }
            Some(name) if !USERNAME_PATTERN.is_match(name) => problems.push(
                "Username can only contain letters, numbers, and the \
                 characters _.-"
            ),
            Some(_) => {}
        }

        let email = self.email.as_deref().map(normalize_email);

        if !email.as_deref().is_some_and(is_email) {
            problems.push("Please provide a valid email address");
        }

        let password = self.password.unwrap_or_default();

        if password.chars().count() < 8 {
            problems.push("Password must be at least 8 characters long");
        } else if is_weak_password(&password) {
            problems.push(
                "Password is too weak. Please use a stronger password with a \
                 mix of letters, numbers, and symbols"
            );
        }

        problems.finish(())?;

        Ok(Registration {
            name: escape(&name.unwrap_or_default()),
            email: email.unwrap_or_default(),
            password
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    pub email:    Option<String>,
    pub username: Option<String>,
    pub password: Option<String>
}

#[derive(Debug, PartialEq)]
pub enum LoginIdentifier {
    Email(String),
    Username(String)
}

impl LoginIdentifier {
    pub fn query(&self) -> Document {
        match self {
            LoginIdentifier::Email(email) => doc! {"email": email.as_str()},
            LoginIdentifier::Username(name) => doc! {"name": name.as_str()}
        }
    }
}

impl LoginForm {
    pub fn validate(self) -> Result<(LoginIdentifier, String), ErrorResponse> {
        let mut problems = Problems::default();

        let identifier = match (present(&self.email), present(&self.username)) {
            (Some(email), _) if !email.is_empty() => {
                let email = normalize_email(email);

                if !is_email(&email) {
                    problems.push("Please provide a valid email address");
                }

                Some(LoginIdentifier::Email(email))
            }
            (_, Some(username)) if !username.is_empty() => {
                Some(LoginIdentifier::Username(escape(username)))
            }
            _ => {
                problems.push("Please provide a valid email address");
                None
            }
        };

        let password = self.password.unwrap_or_default();

        if password.is_empty() {
            problems.push("Password is required");
        }

        problems.finish(())?;

        match identifier {
            Some(identifier) => Ok((identifier, password)),
            None => Err(ErrorResponse::bad_request(
                "Please provide a valid email address"
            ))
        }
    }
}

/// Parses the date formats the front end sends, normalizing to UTC.
///
/// A bare `YYYY-MM-DD` is taken as noon UTC so it lands on the same
/// calendar day in every campus time zone.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(
            date.and_time(NaiveTime::from_hms_opt(12, 0, 0)?).and_utc()
        );
    }

    [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M"
    ]
    .into_iter()
    .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    .map(|date| date.and_utc())
}

pub fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn parse_choice<T: FromStr>(
    value: &str,
    label: &str,
    plural: &str,
    valid: &[&str],
    problems: &mut Problems
) -> Option<T> {
    match value.parse() {
        Ok(choice) => Some(choice),
        Err(_) => {
            problems.push(format!(
                "Invalid {label}: {value}. Valid {plural} are: {}",
                valid.join(", ")
            ));
            None
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "true" | "on" | "1" | "yes")
}

/// Event fields as submitted, either as multipart text fields on create or
/// as JSON on update.
#[derive(Debug, Default, Deserialize)]
pub struct EventForm {
    pub title:      Option<String>,
    pub location:   Option<String>,
    pub date:       Option<String>,
    pub group:      Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub theme:      Option<String>,
    pub urgent:     Option<bool>,
    pub size:       Option<PosterSize>
}

impl EventForm {
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, ErrorResponse> {
        let text = |name: &str| fields.get(name).cloned();

        let size = match (fields.get("size"), fields.get("width"), fields.get("height")) {
            (Some(size), _, _) => Some(
                serde_json::from_str::<PosterSize>(size).map_err(|_| {
                    ErrorResponse::bad_request(
                        "Invalid poster size: width and height must be \
                         between 1 and 4"
                    )
                })?
            ),
            (None, Some(width), Some(height)) => Some(PosterSize {
                width:  width.trim().parse().unwrap_or(0),
                height: height.trim().parse().unwrap_or(0)
            }),
            _ => None
        };

        Ok(Self {
            title: text("title"),
            location: text("location"),
            date: text("date"),
            group: text("group"),
            event_type: text("type"),
            theme: text("theme"),
            urgent: fields.get("urgent").map(|urgent| parse_flag(urgent)),
            size
        })
    }

    /// Validates the form; `partial` allows required fields to be absent,
    /// as on update.
    pub fn validate(self, partial: bool) -> Result<EventChanges, ErrorResponse> {
        let mut problems = Problems::default();

        let mut required = |value: Option<String>, field: &str| match value {
            None if partial => None,
            None => {
                problems.push(format!("Event {field} is required"));
                None
            }
            Some(value) if value.trim().is_empty() => {
                problems.push(format!("Event {field} cannot be empty"));
                None
            }
            Some(value) => Some(value.trim().to_string())
        };

        let title = required(self.title, "title").map(|v| escape(&v));
        let location = required(self.location, "location").map(|v| escape(&v));
        let group = required(self.group, "group").map(|v| escape(&v));
        let date = required(self.date, "date");

        let date = date.and_then(|date| match parse_date(&date) {
            Some(parsed) => Some(parsed),
            None => {
                problems.push(format!(
                    "Invalid date format: {date}. Could not parse as a valid \
                     date."
                ));
                None
            }
        });

        let event_type = self.event_type.filter(|t| !t.is_empty()).and_then(|t| {
            parse_choice::<EventType>(&t, "event type", "types", EventType::VALUES, &mut problems)
        });

        let theme = self.theme.filter(|t| !t.is_empty()).and_then(|t| {
            parse_choice::<Theme>(&t, "event theme", "themes", Theme::VALUES, &mut problems)
        });

        if self.size.is_some_and(|size| !size.is_valid()) {
            problems.push(
                "Invalid poster size: width and height must be between 1 and 4"
            );
        }

        problems.finish(EventChanges {
            title,
            location,
            date,
            group,
            event_type,
            theme,
            urgent: self.urgent,
            size: self.size
        })
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct EventChanges {
    pub title:      Option<String>,
    pub location:   Option<String>,
    pub date:       Option<DateTime<Utc>>,
    pub group:      Option<String>,
    pub event_type: Option<EventType>,
    pub theme:      Option<Theme>,
    pub urgent:     Option<bool>,
    pub size:       Option<PosterSize>
}

impl EventChanges {
    /// Builds a new event; only valid after a non-partial validation.
    pub fn into_event(self, user: ObjectId, image: Option<String>) -> Event {
        let now = bson::DateTime::now();

        Event {
            id: ObjectId::new(),
            title: self.title.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            date: self
                .date
                .map(bson::DateTime::from_chrono)
                .unwrap_or(now),
            group: self.group.unwrap_or_default(),
            event_type: self.event_type.unwrap_or_default(),
            theme: self.theme.unwrap_or_default(),
            urgent: self.urgent.unwrap_or(false),
            size: self.size.unwrap_or_default(),
            image,
            user,
            created_at: now,
            updated_at: now
        }
    }

    /// `$set` document for the fields that were supplied.
    pub fn to_set(&self) -> Document {
        let mut set = doc! {"updatedAt": bson::DateTime::now()};

        if let Some(title) = &self.title {
            set.insert("title", title.clone());
        }
        if let Some(location) = &self.location {
            set.insert("location", location.clone());
        }
        if let Some(date) = self.date {
            set.insert("date", bson::DateTime::from_chrono(date));
        }
        if let Some(group) = &self.group {
            set.insert("group", group.clone());
        }
        if let Some(event_type) = self.event_type {
            set.insert("type", event_type.as_str());
        }
        if let Some(theme) = self.theme {
            set.insert("theme", theme.as_str());
        }
        if let Some(urgent) = self.urgent {
            set.insert("urgent", urgent);
        }
        if let Some(size) = self.size {
            set.insert("size", doc! {"width": size.width, "height": size.height});
        }

        set
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AnnouncementForm {
    pub title:    Option<String>,
    #[serde(rename = "type")]
    pub kind:     Option<String>,
    pub theme:    Option<String>,
    pub location: Option<String>,
    pub date:     Option<String>,
    pub group:    Option<String>,
    pub image:    Option<String>,
    pub urgent:   Option<bool>,
    pub size:     Option<PosterSize>
}

impl AnnouncementForm {
    /// `$set` document of the supplied fields; `partial` is false on create,
    /// where title and type are required.
    pub fn validate(self, partial: bool) -> Result<Document, ErrorResponse> {
        let mut problems = Problems::default();
        let mut set = doc! {};

        match present(&self.title) {
            Some(title) if !title.is_empty() => {
                set.insert("title", escape(title));
            }
            Some(_) => problems.push("Announcement title cannot be empty"),
            None if !partial => problems.push("Announcement title is required"),
            None => {}
        }

        match present(&self.kind) {
            Some(kind) if !kind.is_empty() => {
                if let Some(kind) = parse_choice::<AnnouncementType>(
                    kind,
                    "announcement type",
                    "types",
                    AnnouncementType::VALUES,
                    &mut problems
                ) {
                    set.insert("type", kind.as_str());
                }
            }
            _ if !partial => problems.push("Announcement type is required"),
            _ => {}
        }

        if let Some(theme) = present(&self.theme).filter(|t| !t.is_empty()) {
            if let Some(theme) = parse_choice::<Theme>(
                theme,
                "announcement theme",
                "themes",
                Theme::VALUES,
                &mut problems
            ) {
                set.insert("theme", theme.as_str());
            }
        }

        if let Some(date) = present(&self.date).filter(|d| !d.is_empty()) {
            match parse_date(date) {
                Some(parsed) => {
                    set.insert("date", bson::DateTime::from_chrono(parsed));
                }
                None => problems.push(format!(
                    "Invalid date format: {date}. Could not parse as a valid \
                     date."
                ))
            }
        }

        for (field, value) in [
            ("location", &self.location),
            ("group", &self.group),
            ("image", &self.image)
        ] {
            if let Some(value) = present(value) {
                set.insert(field, escape(value));
            }
        }

        if let Some(urgent) = self.urgent {
            set.insert("urgent", urgent);
        }

        match self.size {
            Some(size) if !size.is_valid() => problems.push(
                "Invalid poster size: width and height must be between 1 and 4"
            ),
            Some(size) => {
                set.insert("size", doc! {"width": size.width, "height": size.height});
            }
            None => {}
        }

        problems.finish(set)
    }
}

/// Tags arrive as a JSON array, or as a comma separated list.
pub fn parse_tags(value: &str) -> Vec<String> {
    let tags = serde_json::from_str::<Vec<String>>(value).unwrap_or_else(|_| {
        value.split(',').map(str::to_string).collect()
    });

    clean_tags(tags)
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| escape(tag.trim()))
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Text(String)
}

impl TagsInput {
    pub fn into_tags(self) -> Vec<String> {
        match self {
            TagsInput::List(tags) => clean_tags(tags),
            TagsInput::Text(text) => parse_tags(&text)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceForm {
    pub title:       Option<String>,
    pub description: Option<String>,
    pub category:    Option<String>,
    pub tags:        Option<TagsInput>,
    pub is_public:   Option<bool>
}

#[derive(Debug, PartialEq)]
pub struct ResourceChanges {
    pub title:       Option<String>,
    pub description: Option<String>,
    pub category:    Option<ResourceCategory>,
    pub tags:        Option<Vec<String>>,
    pub is_public:   Option<bool>
}

impl ResourceForm {
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        Self {
            title:       fields.get("title").cloned(),
            description: fields.get("description").cloned(),
            category:    fields.get("category").cloned(),
            tags:        fields.get("tags").cloned().map(TagsInput::Text),
            is_public:   fields.get("isPublic").map(|value| parse_flag(value))
        }
    }

    pub fn validate(self, partial: bool) -> Result<ResourceChanges, ErrorResponse> {
        let mut problems = Problems::default();

        let title = match present(&self.title) {
            Some(title) if !title.is_empty() => Some(escape(title)),
            None if partial => None,
            _ => {
                problems.push("Resource title is required");
                None
            }
        };

        let category = present(&self.category).filter(|c| !c.is_empty()).and_then(
            |category| match category.parse::<ResourceCategory>() {
                Ok(category) => Some(category),
                Err(_) => {
                    problems.push("Invalid resource category");
                    None
                }
            }
        );

        problems.finish(ResourceChanges {
            title,
            description: present(&self.description).map(escape),
            category,
            tags: self.tags.map(TagsInput::into_tags),
            is_public: self.is_public
        })
    }
}

impl ResourceChanges {
    pub fn to_set(&self) -> Document {
        let mut set = doc! {"updatedAt": bson::DateTime::now()};

        if let Some(title) = &self.title {
            set.insert("title", title.clone());
        }
        if let Some(description) = &self.description {
            set.insert("description", description.clone());
        }
        if let Some(category) = self.category {
            set.insert("category", category.as_str());
        }
        if let Some(tags) = &self.tags {
            set.insert("tags", tags.clone());
        }
        if let Some(is_public) = self.is_public {
            set.insert("isPublic", is_public);
        }

        set
    }
}

/// `(page, limit, skip)` from optional query values. `skip` always fits the
/// signed 64-bit value Mongo stores it as.
pub fn pagination(page: Option<u64>, limit: Option<u64>) -> (u64, u64, u64) {
    let limit = limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);
    let page = page
        .unwrap_or(1)
        .clamp(1, i64::MAX as u64 / limit);

    (page, limit, (page - 1) * limit)
}

/// Case-insensitive literal match, safe to hand to `$regex`.
pub fn search_pattern(search: &str) -> bson::Regex {
    bson::Regex {
        pattern: regex::escape(search.trim()),
        options: "i".to_string()
    }
}

pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Non-blank, trimmed text or the given message as a 400.
pub fn required_text(value: Option<String>, message: &str) -> Result<String, ErrorResponse> {
    non_blank(value).ok_or_else(|| ErrorResponse::bad_request(message))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn registration_accepts_username_alias_and_normalizes_email() {
        let registration = RegisterForm {
            username: Some(" ada_l ".to_string()),
            email: Some(" Ada@Campus.EDU ".to_string()),
            password: Some("correct horse".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert_eq!(registration.name, "ada_l");
        assert_eq!(registration.email, "ada@campus.edu");
    }

    #[test]
    fn registration_collects_every_problem() {
        let error = RegisterForm {
            name: Some("a!".to_string()),
            email: Some("nope".to_string()),
            password: Some("short".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();

        assert_eq!(error.status, 400);
        assert_eq!(
            error.detail,
            "Username must be at least 3 characters long, Please provide a \
             valid email address, Password must be at least 8 characters long"
        );
    }

    #[test]
    fn weak_passwords() {
        assert!(is_weak_password("password"));
        assert!(is_weak_password("12345678"));
        assert!(!is_weak_password("password1"));
        assert!(!is_weak_password("onlylowercaseletters"));
    }

    #[test]
    fn username_characters() {
        let error = RegisterForm {
            name: Some("bad name".to_string()),
            email: Some("a@b.edu".to_string()),
            password: Some("Password1".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();

        assert!(error.detail.starts_with("Username can only contain"));
    }

    #[test]
    fn login_by_email_or_username() {
        let (identifier, password) = LoginForm {
            email: Some("ADA@campus.edu".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert_eq!(identifier, LoginIdentifier::Email("ada@campus.edu".to_string()));
        assert_eq!(password, "secret");

        let (identifier, _) = LoginForm {
            username: Some("ada".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert_eq!(identifier.query(), doc! {"name": "ada"});

        let error = LoginForm::default().validate().unwrap_err();

        assert_eq!(
            error.detail,
            "Please provide a valid email address, Password is required"
        );
    }

    #[test]
    fn dates_normalize_to_utc() {
        assert_eq!(
            parse_date("2025-03-01T10:00:00-08:00"),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date("2025-03-01"),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date("2025-03-01T09:30"),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap())
        );
        assert_eq!(parse_date("next friday"), None);
    }

    #[test]
    fn start_of_day() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 23, 59, 59).unwrap();

        assert_eq!(
            start_of_utc_day(now),
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn event_requires_core_fields() {
        let error = EventForm::default().validate(false).unwrap_err();

        assert_eq!(
            error.detail,
            "Event title is required, Event location is required, Event \
             group is required, Event date is required"
        );

        assert_eq!(EventForm::default().validate(true).unwrap(), EventChanges::default());
    }

    #[test]
    fn event_rejects_unknown_choices_and_dates() {
        let error = EventForm::from_fields(&fields(&[
            ("title", "Mixer"),
            ("location", "Hall"),
            ("group", "ASI"),
            ("date", "someday"),
            ("type", "party"),
            ("theme", "neon")
        ]))
        .unwrap()
        .validate(false)
        .unwrap_err();

        assert_eq!(
            error.detail,
            "Invalid date format: someday. Could not parse as a valid date., \
             Invalid event type: party. Valid types are: event, club, \
             academic, sports, Invalid event theme: neon. Valid themes are: \
             asi, stem, arts, business, cs"
        );
    }

    #[test]
    fn event_from_multipart_fields() {
        let changes = EventForm::from_fields(&fields(&[
            ("title", "<b>Jazz night"),
            ("location", "Quad"),
            ("group", "Music"),
            ("date", "2025-05-02"),
            ("type", "club"),
            ("urgent", "true"),
            ("size", r#"{"width":2,"height":3}"#)
        ]))
        .unwrap()
        .validate(false)
        .unwrap();

        assert_eq!(changes.title.as_deref(), Some("&lt;b&gt;Jazz night"));
        assert_eq!(changes.event_type, Some(EventType::Club));
        assert_eq!(changes.urgent, Some(true));
        assert_eq!(changes.size, Some(PosterSize { width: 2, height: 3 }));

        let event = changes.into_event(ObjectId::new(), None);

        assert_eq!(event.theme, Theme::Asi);
        assert_eq!(
            event.date.to_chrono(),
            Utc.with_ymd_and_hms(2025, 5, 2, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn event_size_out_of_range() {
        let error = EventForm {
            size: Some(PosterSize { width: 5, height: 1 }),
            ..Default::default()
        }
        .validate(true)
        .unwrap_err();

        assert!(error.detail.starts_with("Invalid poster size"));
    }

    #[test]
    fn partial_event_update_sets_only_supplied_fields() {
        let set = EventForm {
            title: Some("Moved".to_string()),
            urgent: Some(false),
            ..Default::default()
        }
        .validate(true)
        .unwrap()
        .to_set();

        assert_eq!(set.get_str("title").unwrap(), "Moved");
        assert!(!set.get_bool("urgent").unwrap());
        assert!(set.contains_key("updatedAt"));
        assert!(!set.contains_key("location"));
    }

    #[test]
    fn announcement_requires_title_and_type() {
        let error = AnnouncementForm::default().validate(false).unwrap_err();

        assert_eq!(
            error.detail,
            "Announcement title is required, Announcement type is required"
        );

        let set = AnnouncementForm {
            title: Some("Power outage".to_string()),
            kind: Some("urgent".to_string()),
            ..Default::default()
        }
        .validate(false)
        .unwrap();

        assert_eq!(set.get_str("type").unwrap(), "urgent");
    }

    #[test]
    fn tags_from_json_or_commas() {
        assert_eq!(parse_tags(r#"["math", " exam "]"#), vec!["math", "exam"]);
        assert_eq!(parse_tags("math, exam,,"), vec!["math", "exam"]);
        assert_eq!(
            TagsInput::List(vec!["a".to_string(), " ".to_string()]).into_tags(),
            vec!["a"]
        );
    }

    #[test]
    fn resource_fields() {
        let changes = ResourceForm::from_fields(&fields(&[
            ("title", "Syllabus"),
            ("category", "academic"),
            ("tags", "cs101"),
            ("isPublic", "false")
        ]))
        .validate(false)
        .unwrap();

        assert_eq!(changes.category, Some(ResourceCategory::Academic));
        assert_eq!(changes.tags, Some(vec!["cs101".to_string()]));
        assert_eq!(changes.is_public, Some(false));

        let error = ResourceForm {
            category: Some("memes".to_string()),
            ..Default::default()
        }
        .validate(false)
        .unwrap_err();

        assert_eq!(error.detail, "Resource title is required, Invalid resource category");
    }

    #[test]
    fn pagination_bounds() {
        assert_eq!(pagination(None, None), (1, 10, 0));
        assert_eq!(pagination(Some(3), Some(20)), (3, 20, 40));
        assert_eq!(pagination(Some(0), Some(0)), (1, 1, 0));
        assert_eq!(pagination(Some(1), Some(1000)), (1, 100, 0));

        let (page, limit, skip) = pagination(Some(u64::MAX), Some(100));

        assert_eq!(limit, 100);
        assert_eq!(page, i64::MAX as u64 / 100);
        assert!(skip <= i64::MAX as u64);
    }

    #[test]
    fn search_is_literal() {
        assert_eq!(search_pattern("c++ (intro)").pattern, r"c\+\+ \(intro\)");
    }
}
