//! CLI commands
//!
//! Each command maps onto one session operation or one raw request through
//! the authenticated client, and yields the JSON printed to stdout.

use anyhow::{Context, bail};
use api_auth::{ChangePasswordRequest, LoginRequest, RegisterRequest};
use api_client::Session;
use api_transport::{RequestDescriptor, Response};
use serde_json::{Value, json};

pub const USAGE: &str = "\
usage: api-cli [--config <path>] <command>

commands:
  login <username> <password>
  register <username> <password> <email>
  profile
  get <path>
  post <path> [json]
  put <path> [json]
  delete <path>
  refresh
  change-password <old> <new>
  logout";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { username: String, password: String },
    Register { username: String, password: String, email: String },
    Profile,
    Get { path: String },
    Post { path: String, body: Option<Value> },
    Put { path: String, body: Option<Value> },
    Delete { path: String },
    Refresh,
    ChangePassword { old_password: String, new_password: String },
    Logout,
}

impl Command {
    /// Parse the positional arguments following any `--config` flag.
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let command = match args.as_slice() {
            ["login", username, password] => Command::Login {
                username: username.to_string(),
                password: password.to_string(),
            },
            ["register", username, password, email] => Command::Register {
                username: username.to_string(),
                password: password.to_string(),
                email: email.to_string(),
            },
            ["profile"] => Command::Profile,
            ["get", path] => Command::Get {
                path: path.to_string(),
            },
            ["post", path, rest @ ..] if rest.len() <= 1 => Command::Post {
                path: path.to_string(),
                body: parse_body(rest.first().copied())?,
            },
            ["put", path, rest @ ..] if rest.len() <= 1 => Command::Put {
                path: path.to_string(),
                body: parse_body(rest.first().copied())?,
            },
            ["delete", path] => Command::Delete {
                path: path.to_string(),
            },
            ["refresh"] => Command::Refresh,
            ["change-password", old, new] => Command::ChangePassword {
                old_password: old.to_string(),
                new_password: new.to_string(),
            },
            ["logout"] => Command::Logout,
            _ => bail!("{USAGE}"),
        };
        Ok(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Login { .. } => "login",
            Command::Register { .. } => "register",
            Command::Profile => "profile",
            Command::Get { .. } => "get",
            Command::Post { .. } => "post",
            Command::Put { .. } => "put",
            Command::Delete { .. } => "delete",
            Command::Refresh => "refresh",
            Command::ChangePassword { .. } => "change-password",
            Command::Logout => "logout",
        }
    }

    pub async fn run(&self, session: &Session) -> api_client::Result<Value> {
        match self {
            Command::Login { username, password } => {
                let response = session
                    .login(&LoginRequest {
                        username: username.clone(),
                        password: password.clone(),
                    })
                    .await?;
                Ok(json!({"username": response.username, "email": response.email}))
            }
            Command::Register {
                username,
                password,
                email,
            } => {
                session
                    .register(&RegisterRequest {
                        username: username.clone(),
                        password: password.clone(),
                        email: email.clone(),
                    })
                    .await
            }
            Command::Profile => {
                let profile = session.profile().await?;
                serde_json::to_value(profile)
                    .map_err(|e| api_client::ClientError::Decode(e.to_string()))
            }
            Command::Get { path } => send(session, RequestDescriptor::get(path)).await,
            Command::Post { path, body } => {
                send(session, with_optional_body(RequestDescriptor::post(path), body)).await
            }
            Command::Put { path, body } => {
                send(session, with_optional_body(RequestDescriptor::put(path), body)).await
            }
            Command::Delete { path } => send(session, RequestDescriptor::delete(path)).await,
            Command::Refresh => {
                session.client().refresh_now().await?;
                Ok(json!({"refreshed": true}))
            }
            Command::ChangePassword {
                old_password,
                new_password,
            } => {
                session
                    .change_password(&ChangePasswordRequest {
                        old_password: old_password.clone(),
                        new_password: new_password.clone(),
                    })
                    .await?;
                Ok(json!({"password_changed": true}))
            }
            Command::Logout => {
                session.logout();
                Ok(json!({"signed_out": true}))
            }
        }
    }
}

fn parse_body(raw: Option<&str>) -> anyhow::Result<Option<Value>> {
    raw.map(|raw| serde_json::from_str(raw).context("request body is not valid JSON"))
        .transpose()
}

fn with_optional_body(request: RequestDescriptor, body: &Option<Value>) -> RequestDescriptor {
    match body {
        Some(body) => request.with_json(body.clone()),
        None => request,
    }
}

async fn send(session: &Session, request: RequestDescriptor) -> api_client::Result<Value> {
    let response = session.client().send(request).await?;
    Ok(body_value(&response))
}

/// JSON body as-is; anything else as a string. Empty bodies become null.
fn body_value(response: &Response) -> Value {
    if response.body.is_empty() {
        return Value::Null;
    }
    response
        .json()
        .unwrap_or_else(|_| Value::String(response.text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use api_auth::{Credential, CredentialStore, MemoryCredentialStore, REFRESH_PATH};
    use api_client::AuthenticatedClient;
    use api_client::testing::{MockTransport, RecordingSink, bearer_of, ok_json, unauthorized};
    use api_transport::Method;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn session(
        transport: MockTransport,
        credential: Option<&str>,
    ) -> (Session, Arc<MockTransport>, Arc<MemoryCredentialStore>) {
        let transport = Arc::new(transport);
        let store = Arc::new(match credential {
            Some(token) => MemoryCredentialStore::with_credential(Credential::new(token)),
            None => MemoryCredentialStore::new(),
        });
        let client = AuthenticatedClient::new(
            transport.clone(),
            store.clone(),
            Arc::new(RecordingSink::new()),
        );
        (Session::new(Arc::new(client)), transport, store)
    }

    #[test]
    fn parses_every_command() {
        assert_eq!(
            Command::parse(&args(&["login", "alice", "pw"])).unwrap(),
            Command::Login {
                username: "alice".into(),
                password: "pw".into()
            }
        );
        assert_eq!(
            Command::parse(&args(&["register", "bob", "pw", "b@example.com"])).unwrap(),
            Command::Register {
                username: "bob".into(),
                password: "pw".into(),
                email: "b@example.com".into()
            }
        );
        assert_eq!(Command::parse(&args(&["profile"])).unwrap(), Command::Profile);
        assert_eq!(
            Command::parse(&args(&["get", "/bills"])).unwrap(),
            Command::Get {
                path: "/bills".into()
            }
        );
        assert_eq!(
            Command::parse(&args(&["post", "/bills", r#"{"amount":12}"#])).unwrap(),
            Command::Post {
                path: "/bills".into(),
                body: Some(json!({"amount": 12}))
            }
        );
        assert_eq!(
            Command::parse(&args(&["put", "/bills/1"])).unwrap(),
            Command::Put {
                path: "/bills/1".into(),
                body: None
            }
        );
        assert_eq!(
            Command::parse(&args(&["delete", "/bills/1"])).unwrap(),
            Command::Delete {
                path: "/bills/1".into()
            }
        );
        assert_eq!(Command::parse(&args(&["refresh"])).unwrap(), Command::Refresh);
        assert_eq!(
            Command::parse(&args(&["change-password", "old", "new"])).unwrap(),
            Command::ChangePassword {
                old_password: "old".into(),
                new_password: "new".into()
            }
        );
        assert_eq!(Command::parse(&args(&["logout"])).unwrap(), Command::Logout);
    }

    #[test]
    fn rejects_bad_invocations() {
        assert!(Command::parse(&[]).is_err());
        assert!(Command::parse(&args(&["login", "alice"])).is_err());
        assert!(Command::parse(&args(&["frobnicate"])).is_err());
        assert!(Command::parse(&args(&["post", "/bills", "{}", "extra"])).is_err());

        let err = Command::parse(&args(&["post", "/bills", "{not json"])).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"), "got: {err}");
    }

    #[tokio::test]
    async fn login_prints_user_without_token() {
        let (session, _, store) = session(
            MockTransport::new(|_| async {
                Ok(ok_json(json!({"token": "tok1", "username": "alice", "email": null})))
            }),
            None,
        );

        let out = Command::parse(&args(&["login", "alice", "pw"]))
            .unwrap()
            .run(&session)
            .await
            .unwrap();

        assert_eq!(out, json!({"username": "alice", "email": null}));
        assert_eq!(store.get(), Some(Credential::new("tok1")));
    }

    #[tokio::test]
    async fn raw_requests_carry_method_and_body() {
        let (session, transport, _) = session(
            MockTransport::new(|_| async { Ok(ok_json(json!({"id": 1}))) }),
            Some("tok1"),
        );

        let out = Command::Post {
            path: "/bills".into(),
            body: Some(json!({"amount": 12})),
        }
        .run(&session)
        .await
        .unwrap();
        assert_eq!(out, json!({"id": 1}));

        Command::Delete {
            path: "/bills/1".into(),
        }
        .run(&session)
        .await
        .unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(sent[0].body, Some(json!({"amount": 12})));
        assert_eq!(sent[1].method, Method::DELETE);
        assert_eq!(sent[1].authorization.as_deref(), Some("Bearer tok1"));
    }

    #[tokio::test]
    async fn get_recovers_from_expired_credential() {
        let (session, transport, store) = session(
            MockTransport::new(|request| async move {
                if request.targets(REFRESH_PATH) {
                    return Ok(ok_json(json!({"token": "tok2"})));
                }
                match bearer_of(&request).as_deref() {
                    Some("tok2") => Ok(ok_json(json!(["bill"]))),
                    _ => Err(unauthorized()),
                }
            }),
            Some("tok1"),
        );

        let out = Command::Get {
            path: "/bills".into(),
        }
        .run(&session)
        .await
        .unwrap();

        assert_eq!(out, json!(["bill"]));
        assert_eq!(store.get(), Some(Credential::new("tok2")));
        assert_eq!(transport.count(REFRESH_PATH), 1);
    }

    #[tokio::test]
    async fn refresh_command_stores_new_token() {
        let (session, _, store) = session(
            MockTransport::new(|_| async { Ok(ok_json(json!({"token": "tok2"}))) }),
            Some("tok1"),
        );

        let out = Command::Refresh.run(&session).await.unwrap();
        assert_eq!(out, json!({"refreshed": true}));
        assert_eq!(store.get(), Some(Credential::new("tok2")));
    }

    #[tokio::test]
    async fn logout_is_local() {
        let (session, transport, store) = session(
            MockTransport::new(|_| async { Ok(ok_json(json!({}))) }),
            Some("tok1"),
        );

        Command::Logout.run(&session).await.unwrap();
        assert!(store.get().is_none());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn non_json_body_becomes_string() {
        let response = Response::new(200, api_transport::HeaderMap::new(), "plain text".into());
        assert_eq!(body_value(&response), json!("plain text"));

        let empty = Response::new(200, api_transport::HeaderMap::new(), "".into());
        assert_eq!(body_value(&empty), Value::Null);
    }
}
