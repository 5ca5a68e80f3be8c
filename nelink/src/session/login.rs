//! Login procedure shared by every interactive dialect.

use log::{debug, info};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};

use super::{Session, SessionState};
use crate::channel::Expectation;
use crate::error::{Result, SessionError, Step};

impl Session {
    /// Take the freshly opened shell to the command prompt.
    ///
    /// Runs the dialect's steps in order: initial prompt, mode entry,
    /// identity and secret exchange, agreement race, paging command and
    /// ready check. Any failure closes the shell before returning.
    pub async fn login(&mut self, username: &str, password: &SecretString) -> Result<()> {
        if self.state != SessionState::Opened {
            return Err(SessionError::AlreadyConnected {
                host: self.host.clone(),
                port: self.port,
            }
            .into());
        }

        match self.login_steps(username, password.expose_secret()).await {
            Ok(()) => {
                self.state = SessionState::Ready;
                info!("{}:{} logged in ({})", self.host, self.port, self.dialect.kind);
                Ok(())
            }
            Err(e) => {
                debug!("{}:{} login failed: {}", self.host, self.port, e);
                self.close().await;
                Err(e)
            }
        }
    }

    async fn login_steps(&mut self, username: &str, password: &str) -> Result<()> {
        let dialect = self.dialect;
        let patterns = &dialect.patterns;
        let prompt = Expectation::new(&patterns.prompt);

        if dialect.await_initial_prompt {
            let found = self
                .expect(Step::InitialPrompt, None, &prompt, self.timeouts.initial_prompt)
                .await?;
            if let Some(re) = &dialect.name_discovery {
                self.discovered_name = discover_name(re, found.matched.as_bytes());
                if let Some(name) = &self.discovered_name {
                    debug!("{}:{} advertises name {}", self.host, self.port, name);
                }
            }
        }

        if !dialect.enter_mode.is_empty() {
            for line in &dialect.enter_mode {
                self.send(Step::EnterMode, line, line).await?;
            }
            self.expect(Step::EnterMode, None, &prompt, self.timeouts.enter_mode)
                .await?;
        }

        // Once the secret is out the device may reject it at any later step.
        let mut rejection: Option<&Regex> = None;

        if let (Some(username_re), Some(password_re)) = (&patterns.username, &patterns.password) {
            self.state = SessionState::AwaitingIdentity;
            self.expect(
                Step::IdentityExpect,
                None,
                &Expectation::new(username_re),
                self.timeouts.identity,
            )
            .await?;
            self.send(Step::Send, "username", username).await?;

            self.state = SessionState::AwaitingSecret;
            self.expect(
                Step::SecretExpect,
                None,
                &Expectation::new(password_re),
                self.timeouts.secret,
            )
            .await?;
            self.send_secret(Step::Send, "password", password).await?;
            rejection = patterns.auth_failure.as_ref();
        }

        if let Some(agreement) = &patterns.agreement {
            self.state = SessionState::AwaitingConfirmation;
            let race = Expectation::new(agreement)
                .or(&patterns.prompt)
                .unless_maybe(rejection);
            let found = self
                .expect(Step::ConfirmationExpect, None, &race, self.timeouts.confirmation)
                .await?;

            if found.pattern_index == 0 {
                self.send(Step::Send, "yes", "yes").await?;
                let after = Expectation::new(&patterns.prompt).unless_maybe(rejection);
                self.expect(
                    Step::ConfirmationExpect,
                    Some("yes"),
                    &after,
                    self.timeouts.post_agreement,
                )
                .await?;
            }
        }

        if let Some(command) = dialect.paging_command {
            self.send(Step::Send, command, command).await?;
        }

        if dialect.confirm_ready {
            let ready = Expectation::new(&patterns.prompt).unless_maybe(rejection);
            self.expect(Step::ReadyExpect, dialect.paging_command, &ready, self.timeouts.ready)
                .await?;
        }

        Ok(())
    }
}

fn discover_name(re: &Regex, prompt: &[u8]) -> Option<String> {
    re.captures(prompt)
        .and_then(|caps| caps.name("name"))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelControl, ShellChannel};
    use crate::platform::{DeviceKind, dialect};
    use crate::test_support::FakeDevice;

    fn session(kind: DeviceKind) -> (Session, FakeDevice) {
        crate::test_support::init_logging();
        let (shell, remote) = ShellChannel::pair();
        let session = Session::new(dialect(kind).unwrap(), shell, "10.0.0.7", 22);
        (session, FakeDevice::new(remote))
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[tokio::test]
    async fn test_identity_secret_login() {
        let (mut session, mut device) = session(DeviceKind::VendorCliB);
        let script = tokio::spawn(async move {
            device.emit("Username: ").await;
            assert_eq!(device.expect_line().await, "alice");
            device.emit("Password: ").await;
            assert_eq!(device.expect_line().await, "secret");
            assert_eq!(device.expect_line().await, "paging status disable");
            device.emit("node-7# ").await;
            device
        });

        session.login("alice", &secret("secret")).await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        script.await.unwrap();
    }

    #[tokio::test]
    async fn test_agreement_banner_answered() {
        let (mut session, mut device) = session(DeviceKind::VendorCliA);
        let script = tokio::spawn(async move {
            device.emit("Username: ").await;
            device.expect_line().await;
            device.emit("Password: ").await;
            device.expect_line().await;
            device.emit("Do you acknowledge? (Y/N)? ").await;
            assert_eq!(device.expect_line().await, "yes");
            device.emit("\r\nnode-7# ").await;
            assert_eq!(device.expect_line().await, "paging status disable");
            device.emit("node-7# ").await;
            device
        });

        session.login("alice", &secret("secret")).await.unwrap();
        assert!(session.is_ready());
        script.await.unwrap();
    }

    #[tokio::test]
    async fn test_agreement_race_prompt_first() {
        let (mut session, mut device) = session(DeviceKind::VendorCliE);
        let script = tokio::spawn(async move {
            device.emit("login: user:").await;
            device.expect_line().await;
            device.emit("password:").await;
            device.expect_line().await;
            device.emit("node-7# ").await;
            assert_eq!(device.expect_line().await, "paging status disable");
            device.emit("node-7# ").await;
            device
        });

        session.login("alice", &secret("secret")).await.unwrap();
        assert!(session.is_ready());
        script.await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_credentials_close_the_shell() {
        let (mut session, mut device) = session(DeviceKind::VendorCliA);
        let script = tokio::spawn(async move {
            device.emit("Username: ").await;
            device.expect_line().await;
            device.emit("Password: ").await;
            device.expect_line().await;
            device.emit("Login failed.").await;
            assert_eq!(device.next_control().await, Some(ChannelControl::Close));
        });

        let err = session.login("alice", &secret("wrong")).await.unwrap_err();
        assert!(err.is_authentication_failure());
        assert_eq!(session.state(), SessionState::Closed);
        script.await.unwrap();
    }

    #[tokio::test]
    async fn test_rejection_seen_without_agreement_step() {
        let (mut session, mut device) = session(DeviceKind::VendorCliB);
        let script = tokio::spawn(async move {
            device.emit("Username: ").await;
            device.expect_line().await;
            device.emit("Password: ").await;
            device.expect_line().await;
            device.expect_line().await;
            device.emit("Login failed.\r\n").await;
            device
        });

        let err = session.login("alice", &secret("wrong")).await.unwrap_err();
        assert!(err.is_authentication_failure());
        assert!(!err.is_timeout());
        script.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_identity_prompt_timeout() {
        let (mut session, _device) = session(DeviceKind::VendorCliA);
        let err = session.login("alice", &secret("secret")).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.step(), Some(Step::IdentityExpect));
        assert!(err.to_string().contains("10.0.0.7:22"));
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_router_prompt_names_the_device() {
        let (mut session, mut device) = session(DeviceKind::VendorCliD);
        device.emit("\r\n\r\nA:admin@node-9# ").await;

        session.login("", &secret("")).await.unwrap();
        assert_eq!(session.discovered_name(), Some("node-9"));
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn test_ose_mode_entry() {
        let (mut session, mut device) = session(DeviceKind::NestedOseShell);
        let script = tokio::spawn(async move {
            device.emit("root@shelf-1# ").await;
            assert_eq!(device.expect_line().await, "ose");
            assert_eq!(device.expect_line().await, "");
            assert_eq!(device.expect_line().await, " ");
            assert_eq!(device.expect_line().await, "");
            device.emit("\r\nACT-OSE $ ").await;
            device
        });

        session.login("root", &secret("pw")).await.unwrap();
        assert!(session.is_ready());
        script.await.unwrap();
    }

    #[tokio::test]
    async fn test_login_twice_rejected() {
        let (mut session, mut device) = session(DeviceKind::VendorCliD);
        device.emit("A:admin@node-9# ").await;
        session.login("", &secret("")).await.unwrap();

        let err = session.login("", &secret("")).await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Session(SessionError::AlreadyConnected { .. })
        ));
    }

    #[test]
    fn test_discover_name() {
        let re = Regex::new(r"\w+:\w+@(?P<name>[\w\-]+)#\s").unwrap();
        assert_eq!(discover_name(&re, b"A:admin@core-1# "), Some("core-1".to_string()));
        assert_eq!(discover_name(&re, b"core-1# "), None);
    }
}
