//! Inline-button action tokens.
//!
//! Tokens are colon-delimited ASCII strings such as `reviews_delete_id:7:1`
//! or `u_gifts_page:2`. Parsing rejects unknown prefixes, wrong arity and
//! non-numeric ids or pages.

use std::fmt;
use thiserror::Error;

use crate::content::{CollectionKind, ListMode};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackDataError {
    #[error("unknown action token: {0}")]
    Unknown(String),
    #[error("malformed action token: {0}")]
    Malformed(String),
}

/// A decoded button press
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    Settings,
    GreetingMenu,
    ViewGreeting,
    EditGreeting,
    Menu(CollectionKind),
    Add(CollectionKind),
    Page {
        kind: CollectionKind,
        mode: ListMode,
        page: u32,
    },
    Delete {
        kind: CollectionKind,
        id: i64,
        page: u32,
    },
    Open {
        kind: CollectionKind,
        id: i64,
        page: u32,
    },
    SkipFile,
}

impl CallbackAction {
    pub fn parse(data: &str) -> Result<Self, CallbackDataError> {
        let simple = match data {
            "back_to_settings" => Some(CallbackAction::Settings),
            "greeting_menu" => Some(CallbackAction::GreetingMenu),
            "view_greeting" => Some(CallbackAction::ViewGreeting),
            "edit_greeting" => Some(CallbackAction::EditGreeting),
            "edit_reviews" | "greeting_reviews_back" => {
                Some(CallbackAction::Menu(CollectionKind::Reviews))
            }
            "services_menu" => Some(CallbackAction::Menu(CollectionKind::Services)),
            "gifts_menu" => Some(CallbackAction::Menu(CollectionKind::Gifts)),
            "skip_file" | "services_skip_file" => Some(CallbackAction::SkipFile),
            _ => None,
        };
        if let Some(action) = simple {
            return Ok(action);
        }

        let mut parts = data.split(':');
        let head = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();
        let unknown = || CallbackDataError::Unknown(data.to_string());

        if let Some(rest) = head.strip_prefix("u_") {
            if let Some(plural) = rest.strip_suffix("_page") {
                let kind = CollectionKind::from_plural(plural).ok_or_else(unknown)?;
                let [page] = numbers::<1>(data, &args)?;
                return Ok(CallbackAction::Page {
                    kind,
                    mode: ListMode::Browse,
                    page: to_page(data, page)?,
                });
            }
            if let Some(singular) = rest.strip_suffix("_id") {
                let kind = CollectionKind::from_singular(singular).ok_or_else(unknown)?;
                let [id, page] = numbers::<2>(data, &args)?;
                return Ok(CallbackAction::Open {
                    kind,
                    id,
                    page: to_page(data, page)?,
                });
            }
            return Err(unknown());
        }

        let (plural, action) = head.split_once('_').ok_or_else(unknown)?;
        let kind = CollectionKind::from_plural(plural).ok_or_else(unknown)?;
        match action {
            "add" if args.is_empty() => Ok(CallbackAction::Add(kind)),
            "view_page" | "delete_page" => {
                let [page] = numbers::<1>(data, &args)?;
                let mode = if action == "view_page" {
                    ListMode::View
                } else {
                    ListMode::Delete
                };
                Ok(CallbackAction::Page {
                    kind,
                    mode,
                    page: to_page(data, page)?,
                })
            }
            "delete_id" => {
                let [id, page] = numbers::<2>(data, &args)?;
                Ok(CallbackAction::Delete {
                    kind,
                    id,
                    page: to_page(data, page)?,
                })
            }
            "add" => Err(CallbackDataError::Malformed(data.to_string())),
            _ => Err(unknown()),
        }
    }

    /// Whether only allowlisted admins may trigger this action
    pub fn requires_admin(&self) -> bool {
        match self {
            CallbackAction::Page { mode, .. } => *mode != ListMode::Browse,
            CallbackAction::Open { .. } => false,
            _ => true,
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::Settings => write!(f, "back_to_settings"),
            CallbackAction::GreetingMenu => write!(f, "greeting_menu"),
            CallbackAction::ViewGreeting => write!(f, "view_greeting"),
            CallbackAction::EditGreeting => write!(f, "edit_greeting"),
            CallbackAction::Menu(CollectionKind::Reviews) => write!(f, "edit_reviews"),
            CallbackAction::Menu(kind) => write!(f, "{}_menu", kind.plural()),
            CallbackAction::Add(kind) => write!(f, "{}_add", kind.plural()),
            CallbackAction::Page { kind, mode, page } => match mode {
                ListMode::View => write!(f, "{}_view_page:{page}", kind.plural()),
                ListMode::Delete => write!(f, "{}_delete_page:{page}", kind.plural()),
                ListMode::Browse => write!(f, "u_{}_page:{page}", kind.plural()),
            },
            CallbackAction::Delete { kind, id, page } => {
                write!(f, "{}_delete_id:{id}:{page}", kind.plural())
            }
            CallbackAction::Open { kind, id, page } => {
                write!(f, "u_{}_id:{id}:{page}", kind.singular())
            }
            CallbackAction::SkipFile => write!(f, "skip_file"),
        }
    }
}

fn numbers<const N: usize>(data: &str, args: &[&str]) -> Result<[i64; N], CallbackDataError> {
    let malformed = || CallbackDataError::Malformed(data.to_string());
    if args.len() != N {
        return Err(malformed());
    }
    let mut out = [0i64; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.parse().map_err(|_| malformed())?;
    }
    Ok(out)
}

fn to_page(data: &str, value: i64) -> Result<u32, CallbackDataError> {
    u32::try_from(value).map_err(|_| CallbackDataError::Malformed(data.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_tokens() {
        assert_eq!(
            CallbackAction::parse("reviews_delete_page:2"),
            Ok(CallbackAction::Page {
                kind: CollectionKind::Reviews,
                mode: ListMode::Delete,
                page: 2
            })
        );
        assert_eq!(
            CallbackAction::parse("services_view_page:0"),
            Ok(CallbackAction::Page {
                kind: CollectionKind::Services,
                mode: ListMode::View,
                page: 0
            })
        );
        assert_eq!(
            CallbackAction::parse("u_gifts_page:3"),
            Ok(CallbackAction::Page {
                kind: CollectionKind::Gifts,
                mode: ListMode::Browse,
                page: 3
            })
        );
    }

    #[test]
    fn test_parse_item_tokens() {
        assert_eq!(
            CallbackAction::parse("gifts_delete_id:14:1"),
            Ok(CallbackAction::Delete {
                kind: CollectionKind::Gifts,
                id: 14,
                page: 1
            })
        );
        assert_eq!(
            CallbackAction::parse("u_review_id:7:0"),
            Ok(CallbackAction::Open {
                kind: CollectionKind::Reviews,
                id: 7,
                page: 0
            })
        );
    }

    #[test]
    fn test_parse_fixed_tokens() {
        assert_eq!(CallbackAction::parse("greeting_reviews_back"), Ok(CallbackAction::Menu(CollectionKind::Reviews)));
        assert_eq!(CallbackAction::parse("services_skip_file"), Ok(CallbackAction::SkipFile));
        assert_eq!(CallbackAction::parse("gifts_add"), Ok(CallbackAction::Add(CollectionKind::Gifts)));
        assert_eq!(CallbackAction::parse("view_greeting"), Ok(CallbackAction::ViewGreeting));
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        for data in [
            "reviews_delete_page:abc",
            "reviews_delete_page:",
            "reviews_delete_page",
            "u_service_id:5",
            "u_service_id:x:1",
            "gifts_delete_id:3:1:9",
            "services_view_page:-1",
        ] {
            assert_eq!(
                CallbackAction::parse(data),
                Err(CallbackDataError::Malformed(data.to_string())),
                "{data}"
            );
        }
    }

    #[test]
    fn test_unknown_tokens_are_rejected() {
        for data in ["", "cats_view_page:1", "u_cats_page:1", "u_reviews_open:1", "reviews_publish:1"] {
            assert!(matches!(
                CallbackAction::parse(data),
                Err(CallbackDataError::Unknown(_))
            ));
        }
    }

    #[test]
    fn test_display_produces_parseable_tokens() {
        let actions = [
            CallbackAction::Settings,
            CallbackAction::Menu(CollectionKind::Reviews),
            CallbackAction::Menu(CollectionKind::Gifts),
            CallbackAction::Add(CollectionKind::Services),
            CallbackAction::Page { kind: CollectionKind::Reviews, mode: ListMode::Browse, page: 4 },
            CallbackAction::Delete { kind: CollectionKind::Services, id: 99, page: 2 },
            CallbackAction::Open { kind: CollectionKind::Gifts, id: 5, page: 1 },
            CallbackAction::SkipFile,
        ];
        for action in actions {
            assert_eq!(CallbackAction::parse(&action.to_string()), Ok(action));
        }
        assert_eq!(
            CallbackAction::Delete { kind: CollectionKind::Reviews, id: 7, page: 1 }.to_string(),
            "reviews_delete_id:7:1"
        );
    }

    #[test]
    fn test_admin_only_actions() {
        assert!(CallbackAction::Settings.requires_admin());
        assert!(CallbackAction::Page { kind: CollectionKind::Gifts, mode: ListMode::Delete, page: 0 }.requires_admin());
        assert!(!CallbackAction::Page { kind: CollectionKind::Gifts, mode: ListMode::Browse, page: 0 }.requires_admin());
        assert!(!CallbackAction::Open { kind: CollectionKind::Gifts, id: 1, page: 0 }.requires_admin());
    }
}
