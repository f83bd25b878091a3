use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Declares an enum stored as a lower-case string, along with the list of
/// accepted values used in validation messages.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$variant_meta])* #[serde(rename = $value)] $variant),+
        }

        impl $name {
            pub const VALUES: &'static [&'static str] = &[$($value),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $value),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(())
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    #[derive(Default)]
    Role {
        #[default]
        User => "user",
        Admin => "admin"
    }
}

string_enum! {
    #[derive(Default)]
    EventType {
        #[default]
        Event => "event",
        Club => "club",
        Academic => "academic",
        Sports => "sports"
    }
}

string_enum! {
    AnnouncementType {
        Event => "event",
        Club => "club",
        Academic => "academic",
        Sports => "sports",
        Urgent => "urgent"
    }
}

string_enum! {
    #[derive(Default)]
    Theme {
        #[default]
        Asi => "asi",
        Stem => "stem",
        Arts => "arts",
        Business => "business",
        Cs => "cs"
    }
}

string_enum! {
    #[derive(Default)]
    ThreadCategory {
        #[default]
        General => "general",
        Academic => "academic",
        Clubs => "clubs",
        Events => "events",
        Questions => "questions",
        Announcements => "announcements"
    }
}

string_enum! {
    #[derive(Default)]
    ForumCategory {
        #[default]
        General => "general",
        Academic => "academic",
        Clubs => "clubs",
        Events => "events",
        Announcements => "announcements"
    }
}

string_enum! {
    #[derive(Default)]
    ResourceCategory {
        Academic => "academic",
        Club => "club",
        Event => "event",
        #[default]
        General => "general",
        Administrative => "administrative",
        Other => "other"
    }
}

string_enum! {
    #[derive(Default)]
    FileType {
        Pdf => "pdf",
        Word => "word",
        Powerpoint => "powerpoint",
        Excel => "excel",
        Text => "text",
        Image => "image",
        #[default]
        Other => "other"
    }
}

impl FileType {
    /// Buckets a lower-case file extension into the category shown in the
    /// resource hub.
    pub fn from_extension(extension: &str) -> Self {
        match extension {
            "pdf" => FileType::Pdf,
            "doc" | "docx" => FileType::Word,
            "ppt" | "pptx" => FileType::Powerpoint,
            "xls" | "xlsx" => FileType::Excel,
            "txt" => FileType::Text,
            "jpg" | "jpeg" | "png" | "gif" => FileType::Image,
            _ => FileType::Other
        }
    }
}
