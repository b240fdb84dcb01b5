//! Content kinds curated by the administrator and the descriptors that
//! drive storage, listing and dialogs for each of them.

use serde::{Deserialize, Serialize};

/// Every kind of content an administrator can edit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    Greeting,
    Review,
    Service,
    Gift,
}

impl ContentKind {
    /// The list-backed collection for this kind, if any
    pub fn collection(self) -> Option<CollectionKind> {
        match self {
            ContentKind::Greeting => None,
            ContentKind::Review => Some(CollectionKind::Reviews),
            ContentKind::Service => Some(CollectionKind::Services),
            ContentKind::Gift => Some(CollectionKind::Gifts),
        }
    }

    /// Folder (relative to the media root) receiving uploads for this kind
    pub fn media_folder(self) -> Option<&'static str> {
        match self {
            ContentKind::Greeting => Some("greetings"),
            ContentKind::Review => None,
            ContentKind::Service => Some("services"),
            ContentKind::Gift => Some("gifts"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ContentKind::Greeting => "greeting",
            ContentKind::Review => "review",
            ContentKind::Service => "service",
            ContentKind::Gift => "gift",
        }
    }
}

/// A text field collected by a dialog step
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    Author,
    Text,
    Date,
    Name,
    Description,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Author => "author",
            Field::Text => "text",
            Field::Date => "date",
            Field::Name => "name",
            Field::Description => "description",
        }
    }
}

/// Static description of a list-backed collection
#[derive(Debug)]
pub struct KindDescriptor {
    pub table_name: &'static str,
    /// Plural token used in action tokens and localization keys
    pub plural: &'static str,
    /// Singular token used in detail action tokens
    pub singular: &'static str,
    pub fields: &'static [Field],
    pub has_file_step: bool,
}

const REVIEWS: KindDescriptor = KindDescriptor {
    table_name: "reviews",
    plural: "reviews",
    singular: "review",
    fields: &[Field::Author, Field::Text, Field::Date],
    has_file_step: false,
};

const SERVICES: KindDescriptor = KindDescriptor {
    table_name: "services",
    plural: "services",
    singular: "service",
    fields: &[Field::Name, Field::Description],
    has_file_step: true,
};

const GIFTS: KindDescriptor = KindDescriptor {
    table_name: "gifts",
    plural: "gifts",
    singular: "gift",
    fields: &[Field::Name, Field::Description],
    has_file_step: true,
};

/// The three paginated collections
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    Reviews,
    Services,
    Gifts,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 3] = [
        CollectionKind::Reviews,
        CollectionKind::Services,
        CollectionKind::Gifts,
    ];

    pub fn descriptor(self) -> &'static KindDescriptor {
        match self {
            CollectionKind::Reviews => &REVIEWS,
            CollectionKind::Services => &SERVICES,
            CollectionKind::Gifts => &GIFTS,
        }
    }

    pub fn content_kind(self) -> ContentKind {
        match self {
            CollectionKind::Reviews => ContentKind::Review,
            CollectionKind::Services => ContentKind::Service,
            CollectionKind::Gifts => ContentKind::Gift,
        }
    }

    pub fn plural(self) -> &'static str {
        self.descriptor().plural
    }

    pub fn singular(self) -> &'static str {
        self.descriptor().singular
    }

    pub fn from_plural(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.plural() == token)
    }

    pub fn from_singular(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.singular() == token)
    }
}

/// The three renderings of a collection list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListMode {
    /// Admin read-only list
    View,
    /// Admin list with a delete trigger per item
    Delete,
    /// Customer list with an open trigger per item
    Browse,
}
