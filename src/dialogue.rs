//! Content-entry dialogue module: the steps of each admin dialog and the
//! draft they accumulate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::content::{ContentKind, Field};
use crate::db::{NewItem, NewOffering, NewReview};
use crate::errors::{BotError, BotResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GreetingStep {
    Photo,
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewStep {
    Author,
    Text,
    Date,
}

/// Steps shared by the service and gift dialogs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferingStep {
    Name,
    Description,
    File,
}

/// The step an active dialog is waiting on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogStep {
    Greeting(GreetingStep),
    Review(ReviewStep),
    Service(OfferingStep),
    Gift(OfferingStep),
}

/// What a step accepts from the user
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expectation {
    /// Non-empty text stored under the field
    Text(Field),
    /// An image, nothing else
    Photo,
    /// An image, a document, or an explicit skip
    Attachment,
}

impl DialogStep {
    pub fn first(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Greeting => DialogStep::Greeting(GreetingStep::Photo),
            ContentKind::Review => DialogStep::Review(ReviewStep::Author),
            ContentKind::Service => DialogStep::Service(OfferingStep::Name),
            ContentKind::Gift => DialogStep::Gift(OfferingStep::Name),
        }
    }

    pub fn kind(self) -> ContentKind {
        match self {
            DialogStep::Greeting(_) => ContentKind::Greeting,
            DialogStep::Review(_) => ContentKind::Review,
            DialogStep::Service(_) => ContentKind::Service,
            DialogStep::Gift(_) => ContentKind::Gift,
        }
    }

    /// The following step, or `None` when this step is terminal
    pub fn next(self) -> Option<Self> {
        match self {
            DialogStep::Greeting(GreetingStep::Photo) => Some(DialogStep::Greeting(GreetingStep::Text)),
            DialogStep::Greeting(GreetingStep::Text) => None,
            DialogStep::Review(ReviewStep::Author) => Some(DialogStep::Review(ReviewStep::Text)),
            DialogStep::Review(ReviewStep::Text) => Some(DialogStep::Review(ReviewStep::Date)),
            DialogStep::Review(ReviewStep::Date) => None,
            DialogStep::Service(step) => step.next().map(DialogStep::Service),
            DialogStep::Gift(step) => step.next().map(DialogStep::Gift),
        }
    }

    pub fn expectation(self) -> Expectation {
        match self {
            DialogStep::Greeting(GreetingStep::Photo) => Expectation::Photo,
            DialogStep::Greeting(GreetingStep::Text) => Expectation::Text(Field::Text),
            DialogStep::Review(ReviewStep::Author) => Expectation::Text(Field::Author),
            DialogStep::Review(ReviewStep::Text) => Expectation::Text(Field::Text),
            DialogStep::Review(ReviewStep::Date) => Expectation::Text(Field::Date),
            DialogStep::Service(step) | DialogStep::Gift(step) => step.expectation(),
        }
    }

    /// Localization key of the prompt shown when entering this step
    pub fn prompt_key(self) -> String {
        let step = match self.expectation() {
            Expectation::Text(field) => field.name(),
            Expectation::Photo => "photo",
            Expectation::Attachment => "file",
        };
        format!("prompt-{}-{}", self.kind().name(), step)
    }
}

impl OfferingStep {
    fn next(self) -> Option<Self> {
        match self {
            OfferingStep::Name => Some(OfferingStep::Description),
            OfferingStep::Description => Some(OfferingStep::File),
            OfferingStep::File => None,
        }
    }

    fn expectation(self) -> Expectation {
        match self {
            OfferingStep::Name => Expectation::Text(Field::Name),
            OfferingStep::Description => Expectation::Text(Field::Description),
            OfferingStep::File => Expectation::Attachment,
        }
    }
}

/// Why a text submission was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextRejection {
    Empty,
}

/// Validates a required text field, returning it trimmed
pub fn validate_field_text(input: &str) -> Result<String, TextRejection> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(TextRejection::Empty);
    }

    Ok(trimmed.to_string())
}

/// Fields accumulated by an unfinished dialog
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    fields: BTreeMap<Field, String>,
    media_path: Option<String>,
}

impl Draft {
    pub fn set(&mut self, field: Field, value: String) {
        self.fields.insert(field, value);
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn set_media_path(&mut self, path: String) {
        self.media_path = Some(path);
    }

    pub fn media_path(&self) -> Option<&str> {
        self.media_path.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.media_path.is_none()
    }

    fn require(&self, field: Field) -> BotResult<String> {
        self.get(field)
            .map(str::to_string)
            .ok_or(BotError::IncompleteDraft(field.name()))
    }

    /// Build the record for a collection dialog
    pub fn to_new_item(&self, kind: ContentKind) -> BotResult<NewItem> {
        match kind {
            ContentKind::Review => Ok(NewItem::Review(NewReview {
                author: self.require(Field::Author)?,
                text: self.require(Field::Text)?,
                date: self.require(Field::Date)?,
            })),
            ContentKind::Service | ContentKind::Gift => {
                let offering = NewOffering {
                    name: self.require(Field::Name)?,
                    description: self.require(Field::Description)?,
                    file_path: self.media_path.clone(),
                };
                Ok(if kind == ContentKind::Service {
                    NewItem::Service(offering)
                } else {
                    NewItem::Gift(offering)
                })
            }
            ContentKind::Greeting => Err(BotError::IncompleteDraft("collection")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::CollectionKind;

    fn walk(kind: ContentKind) -> Vec<Expectation> {
        let mut steps = vec![];
        let mut step = Some(DialogStep::first(kind));
        while let Some(current) = step {
            steps.push(current.expectation());
            step = current.next();
        }
        steps
    }

    #[test]
    fn test_field_validation() {
        assert_eq!(validate_field_text("  Anna K.  "), Ok("Anna K.".to_string()));
        assert_eq!(validate_field_text(""), Err(TextRejection::Empty));
        assert_eq!(validate_field_text(" \n\t "), Err(TextRejection::Empty));
    }

    #[test]
    fn test_dialogs_follow_collection_descriptors() {
        for collection in CollectionKind::ALL {
            let descriptor = collection.descriptor();
            let mut expected: Vec<Expectation> =
                descriptor.fields.iter().map(|f| Expectation::Text(*f)).collect();
            if descriptor.has_file_step {
                expected.push(Expectation::Attachment);
            }
            assert_eq!(walk(collection.content_kind()), expected);
        }
    }

    #[test]
    fn test_greeting_dialog_is_photo_then_text() {
        assert_eq!(
            walk(ContentKind::Greeting),
            vec![Expectation::Photo, Expectation::Text(Field::Text)]
        );
    }

    #[test]
    fn test_prompt_keys() {
        assert_eq!(DialogStep::first(ContentKind::Greeting).prompt_key(), "prompt-greeting-photo");
        assert_eq!(DialogStep::Gift(OfferingStep::File).prompt_key(), "prompt-gift-file");
        assert_eq!(DialogStep::Review(ReviewStep::Date).prompt_key(), "prompt-review-date");
    }

    #[test]
    fn test_incomplete_draft_is_an_error() {
        let mut draft = Draft::default();
        draft.set(Field::Name, "Massage".to_string());
        assert!(matches!(
            draft.to_new_item(ContentKind::Service),
            Err(BotError::IncompleteDraft("description"))
        ));

        draft.set(Field::Description, "One hour".to_string());
        let item = draft.to_new_item(ContentKind::Gift).unwrap();
        assert!(matches!(item, NewItem::Gift(NewOffering { file_path: None, .. })));
    }
}
