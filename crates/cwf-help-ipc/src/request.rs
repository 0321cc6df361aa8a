//! Invocation requests and the typed viewer command set.
//!
//! On the wire an invocation request is a method name plus a positional
//! argument array. [`ViewerCommand`] is the typed view of the same
//! messages; receivers decode into it and `match` instead of looking methods
//! up by name at runtime.

use cwf_help_types::{HelpModule, HelpViewType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

pub const METHOD_SHOW: &str = "show";
pub const METHOD_LOAD: &str = "load";
pub const METHOD_MERGE_HELP_SET: &str = "mergeHelpSet";
pub const METHOD_CLOSE: &str = "close";
pub const METHOD_SET_REMOTE_QUEUE: &str = "setRemoteQueue";

/// Key of the object that carries a view type in a `show` request.
pub const VIEW_TYPE_KEY: &str = "viewType";

/// A method name and its arguments, as delivered over a request queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationRequest {
    pub method_name: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl InvocationRequest {
    #[must_use]
    pub fn new(method_name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method_name: method_name.into(),
            args,
        }
    }

    #[must_use]
    pub fn no_args(method_name: impl Into<String>) -> Self {
        Self::new(method_name, Vec::new())
    }

    /// The request used to tell a viewer (or proxy) to shut down.
    #[must_use]
    pub fn close() -> Self {
        Self::no_args(METHOD_CLOSE)
    }
}

/// Commands understood by a help viewer and its proxy.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCommand {
    /// Bring the viewer to the front.
    Show,
    /// Select a navigator view.
    ShowView { view_type: HelpViewType },
    /// Show a topic from the loaded help set with the given home id.
    ShowHome {
        home_id: String,
        topic_id: Option<String>,
    },
    /// Show a topic from a help set, defaulting to its home topic.
    ShowTopic {
        help_set: HelpModule,
        topic_id: Option<String>,
        topic_label: Option<String>,
    },
    /// Replace all loaded help sets.
    Load { help_sets: Vec<HelpModule> },
    MergeHelpSet { help_set: HelpModule },
    Close,
    /// Sent by a popup viewer to its proxy, naming the viewer's own queue.
    SetRemoteQueue { queue: String },
}

impl ViewerCommand {
    #[must_use]
    pub fn method_name(&self) -> &'static str {
        match self {
            ViewerCommand::Show
            | ViewerCommand::ShowView { .. }
            | ViewerCommand::ShowHome { .. }
            | ViewerCommand::ShowTopic { .. } => METHOD_SHOW,
            ViewerCommand::Load { .. } => METHOD_LOAD,
            ViewerCommand::MergeHelpSet { .. } => METHOD_MERGE_HELP_SET,
            ViewerCommand::Close => METHOD_CLOSE,
            ViewerCommand::SetRemoteQueue { .. } => METHOD_SET_REMOTE_QUEUE,
        }
    }

    /// True for the commands that should bring up a viewer window.
    #[must_use]
    pub fn is_show(&self) -> bool {
        self.method_name() == METHOD_SHOW
    }

    /// Encode as an invocation request.
    ///
    /// # Errors
    ///
    /// Returns an error if a help module cannot be serialized.
    pub fn to_request(&self) -> Result<InvocationRequest> {
        let args = match self {
            ViewerCommand::Show | ViewerCommand::Close => Vec::new(),
            ViewerCommand::ShowView { view_type } => {
                let mut tagged = serde_json::Map::new();
                tagged.insert(VIEW_TYPE_KEY.to_string(), Value::from(view_type.as_str()));
                vec![Value::Object(tagged)]
            }
            ViewerCommand::ShowHome { home_id, topic_id } => {
                let mut args = vec![Value::from(home_id.as_str())];
                if let Some(topic_id) = topic_id {
                    args.push(Value::from(topic_id.as_str()));
                }
                args
            }
            ViewerCommand::ShowTopic {
                help_set,
                topic_id,
                topic_label,
            } => vec![
                serde_json::to_value(help_set)?,
                optional_string(topic_id.as_deref()),
                optional_string(topic_label.as_deref()),
            ],
            ViewerCommand::Load { help_sets } => vec![serde_json::to_value(help_sets)?],
            ViewerCommand::MergeHelpSet { help_set } => vec![serde_json::to_value(help_set)?],
            ViewerCommand::SetRemoteQueue { queue } => vec![Value::from(queue.as_str())],
        };

        Ok(InvocationRequest::new(self.method_name(), args))
    }

    /// Decode an invocation request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMethod`] for method names outside the command
    /// set and [`Error::InvalidArguments`] when arity or argument types do not
    /// match any form of the method.
    pub fn from_request(request: &InvocationRequest) -> Result<Self> {
        let method = request.method_name.as_str();
        let args = request.args.as_slice();

        match method {
            METHOD_SHOW => decode_show(args),
            METHOD_LOAD => match args {
                [] | [Value::Null] => Ok(ViewerCommand::Load {
                    help_sets: Vec::new(),
                }),
                [sets] => Ok(ViewerCommand::Load {
                    help_sets: serde_json::from_value(sets.clone())
                        .map_err(|e| Error::invalid_arguments(method, e.to_string()))?,
                }),
                _ => Err(arity(method, args.len())),
            },
            METHOD_MERGE_HELP_SET => match args {
                [help_set] => Ok(ViewerCommand::MergeHelpSet {
                    help_set: decode_module(method, help_set)?,
                }),
                _ => Err(arity(method, args.len())),
            },
            METHOD_CLOSE => match args {
                [] => Ok(ViewerCommand::Close),
                _ => Err(arity(method, args.len())),
            },
            METHOD_SET_REMOTE_QUEUE => match args {
                [Value::String(queue)] => Ok(ViewerCommand::SetRemoteQueue {
                    queue: queue.clone(),
                }),
                [_] => Err(Error::invalid_arguments(method, "expected a queue name")),
                _ => Err(arity(method, args.len())),
            },
            other => Err(Error::UnknownMethod(other.to_string())),
        }
    }
}

impl TryFrom<&InvocationRequest> for ViewerCommand {
    type Error = Error;

    fn try_from(request: &InvocationRequest) -> Result<Self> {
        ViewerCommand::from_request(request)
    }
}

fn optional_string(value: Option<&str>) -> Value {
    value.map_or(Value::Null, Value::from)
}

fn arity(method: &str, count: usize) -> Error {
    Error::invalid_arguments(method, format!("unexpected argument count {count}"))
}

fn decode_module(method: &str, value: &Value) -> Result<HelpModule> {
    serde_json::from_value(value.clone()).map_err(|e| Error::invalid_arguments(method, e.to_string()))
}

fn decode_optional_string(method: &str, value: Option<&Value>) -> Result<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::invalid_arguments(
            method,
            format!("expected string, got {other}"),
        )),
    }
}

/// `show` is overloaded; the form is chosen by arity and the type of the first argument.
///
/// A view type travels as `{"viewType": ...}` so that a bare string is always a home id.
fn decode_show(args: &[Value]) -> Result<ViewerCommand> {
    let method = METHOD_SHOW;

    match args {
        [] => Ok(ViewerCommand::Show),
        [Value::Object(tagged)] if tagged.len() == 1 && tagged.contains_key(VIEW_TYPE_KEY) => {
            let view_type = tagged
                .get(VIEW_TYPE_KEY)
                .and_then(Value::as_str)
                .ok_or_else(|| Error::invalid_arguments(method, "view type must be a string"))?
                .parse::<HelpViewType>()
                .map_err(|e| Error::invalid_arguments(method, e.to_string()))?;
            Ok(ViewerCommand::ShowView { view_type })
        }
        [Value::String(home_id)] => Ok(ViewerCommand::ShowHome {
            home_id: home_id.clone(),
            topic_id: None,
        }),
        [Value::String(home_id), topic] => Ok(ViewerCommand::ShowHome {
            home_id: home_id.clone(),
            topic_id: decode_optional_string(method, Some(topic))?,
        }),
        [module @ Value::Object(_), rest @ ..] if rest.len() <= 2 => Ok(ViewerCommand::ShowTopic {
            help_set: decode_module(method, module)?,
            topic_id: decode_optional_string(method, rest.first())?,
            topic_label: decode_optional_string(method, rest.get(1))?,
        }),
        [_, ..] if args.len() <= 3 => Err(Error::invalid_arguments(
            method,
            "first argument must be a view type, home id or help set",
        )),
        _ => Err(arity(method, args.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn module() -> HelpModule {
        HelpModule::new("cwf_help", "CareWeb Help", "~./org/cwf/help/helpset.json")
    }

    #[test]
    fn test_wire_format() {
        let request = ViewerCommand::ShowView {
            view_type: HelpViewType::Toc,
        }
        .to_request()
        .unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, json!({"methodName": "show", "args": [{"viewType": "toc"}]}));

        let parsed: InvocationRequest =
            serde_json::from_value(json!({"methodName": "close"})).unwrap();
        assert_eq!(parsed, InvocationRequest::close());
    }

    #[test]
    fn test_show_overloads_decode() {
        let cases = vec![
            (json!([]), ViewerCommand::Show),
            (
                json!([{"viewType": "history"}]),
                ViewerCommand::ShowView {
                    view_type: HelpViewType::History,
                },
            ),
            (
                json!(["history"]),
                ViewerCommand::ShowHome {
                    home_id: "history".into(),
                    topic_id: None,
                },
            ),
            (
                json!(["home"]),
                ViewerCommand::ShowHome {
                    home_id: "home".into(),
                    topic_id: None,
                },
            ),
            (
                json!(["home", "intro"]),
                ViewerCommand::ShowHome {
                    home_id: "home".into(),
                    topic_id: Some("intro".into()),
                },
            ),
        ];

        for (args, expected) in cases {
            let Value::Array(args) = args else {
                unreachable!()
            };
            let request = InvocationRequest::new(METHOD_SHOW, args);
            assert_eq!(ViewerCommand::from_request(&request).unwrap(), expected);
        }
    }

    #[test]
    fn test_show_home_named_like_a_view_type() {
        for home_id in ["index", "TOC", "Search", "glossary"] {
            let command = ViewerCommand::ShowHome {
                home_id: home_id.into(),
                topic_id: None,
            };
            let request = command.to_request().unwrap();
            assert_eq!(ViewerCommand::from_request(&request).unwrap(), command);
        }

        for view_type in [HelpViewType::Index, HelpViewType::Glossary] {
            let command = ViewerCommand::ShowView { view_type };
            let request = command.to_request().unwrap();
            assert_eq!(ViewerCommand::from_request(&request).unwrap(), command);
        }
    }

    #[test]
    fn test_show_topic_encodes_nulls_and_decodes() {
        let command = ViewerCommand::ShowTopic {
            help_set: module(),
            topic_id: Some("intro".into()),
            topic_label: None,
        };
        let request = command.to_request().unwrap();
        assert_eq!(request.method_name, "show");
        assert_eq!(request.args.len(), 3);
        assert!(request.args[2].is_null());

        assert_eq!(ViewerCommand::from_request(&request).unwrap(), command);
    }

    #[test]
    fn test_load_accepts_null_and_list() {
        let request = InvocationRequest::new(METHOD_LOAD, vec![Value::Null]);
        assert_eq!(
            ViewerCommand::from_request(&request).unwrap(),
            ViewerCommand::Load {
                help_sets: Vec::new()
            }
        );

        let command = ViewerCommand::Load {
            help_sets: vec![module(), module().with_locale("fr")],
        };
        let request = command.to_request().unwrap();
        assert_eq!(ViewerCommand::from_request(&request).unwrap(), command);
    }

    #[test]
    fn test_unknown_method() {
        let request = InvocationRequest::no_args("print");
        assert!(matches!(
            ViewerCommand::from_request(&request),
            Err(Error::UnknownMethod(m)) if m == "print"
        ));
    }

    #[test]
    fn test_invalid_arguments() {
        let bad = [
            InvocationRequest::new(METHOD_SHOW, vec![json!(42)]),
            InvocationRequest::new(METHOD_SHOW, vec![json!({"viewType": "tabs"})]),
            InvocationRequest::new(METHOD_SHOW, vec![json!({"viewType": 3})]),
            InvocationRequest::new(METHOD_SHOW, vec![json!("a"), json!(1)]),
            InvocationRequest::new(METHOD_SHOW, vec![json!(1), json!(2), json!(3), json!(4)]),
            InvocationRequest::new(METHOD_MERGE_HELP_SET, vec![json!({"id": "x"})]),
            InvocationRequest::new(METHOD_CLOSE, vec![json!(true)]),
            InvocationRequest::new(METHOD_SET_REMOTE_QUEUE, vec![json!(7)]),
        ];

        for request in &bad {
            assert!(
                matches!(
                    ViewerCommand::from_request(request),
                    Err(Error::InvalidArguments { .. })
                ),
                "expected invalid arguments for {request:?}"
            );
        }
    }

    #[test]
    fn test_is_show() {
        assert!(ViewerCommand::Show.is_show());
        assert!(
            ViewerCommand::ShowView {
                view_type: HelpViewType::Toc
            }
            .is_show()
        );
        assert!(!ViewerCommand::Close.is_show());
        assert!(
            !ViewerCommand::MergeHelpSet {
                help_set: module()
            }
            .is_show()
        );
    }
}
