//! Scripted SMTP server for negotiation tests.
#![allow(dead_code)]

use std::{fmt::Write, net::SocketAddr, sync::Arc};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::Mutex,
};

#[derive(Debug, Clone)]
pub struct Reply {
    code: u16,
    lines: Vec<String>,
}

impl Reply {
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            lines: vec![text.into()],
        }
    }

    pub fn multi(code: u16, lines: &[&str]) -> Self {
        Self {
            code,
            lines: lines.iter().map(|line| (*line).to_owned()).collect(),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut reply = String::new();
        let last = self.lines.len().saturating_sub(1);

        for (i, line) in self.lines.iter().enumerate() {
            let separator = if i == last { ' ' } else { '-' };
            let _ = write!(&mut reply, "{}{separator}{line}\r\n", self.code);
        }

        reply.into_bytes()
    }
}

#[derive(Debug, Clone)]
struct Script {
    greeting: Option<Reply>,
    ehlo: Reply,
    starttls: Reply,
    raw_greeting: Option<Vec<u8>>,
}

/// Plays the same script to every connection it accepts.
pub struct MockSmtpServer {
    addr: SocketAddr,
    commands: Arc<Mutex<Vec<String>>>,
}

impl MockSmtpServer {
    pub fn builder() -> MockSmtpServerBuilder {
        MockSmtpServerBuilder {
            script: Script {
                greeting: Some(Reply::new(220, "mock.example.com ESMTP")),
                ehlo: Reply::multi(250, &["mock.example.com", "SIZE 10000", "STARTTLS"]),
                starttls: Reply::new(220, "Ready to start TLS"),
                raw_greeting: None,
            },
        }
    }

    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn commands(&self) -> Vec<String> {
        self.commands.lock().await.clone()
    }

    async fn handle_client(
        mut stream: TcpStream,
        script: Arc<Script>,
        commands: Arc<Mutex<Vec<String>>>,
    ) -> std::io::Result<()> {
        let (reader, mut writer) = stream.split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        if let Some(raw) = &script.raw_greeting {
            writer.write_all(raw).await?;
            return writer.flush().await;
        }

        let Some(greeting) = &script.greeting else {
            // Say nothing and hang up.
            return Ok(());
        };
        writer.write_all(&greeting.to_bytes()).await?;

        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                return Ok(());
            }

            let command = line.trim().to_owned();
            commands.lock().await.push(command.clone());

            let verb = command
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_uppercase();

            let reply = match verb.as_str() {
                "EHLO" => script.ehlo.to_bytes(),
                "STARTTLS" => {
                    writer.write_all(&script.starttls.to_bytes()).await?;
                    return writer.flush().await;
                }
                _ => Reply::new(500, "Unknown command").to_bytes(),
            };
            writer.write_all(&reply).await?;
            writer.flush().await?;
        }
    }
}

pub struct MockSmtpServerBuilder {
    script: Script,
}

impl MockSmtpServerBuilder {
    #[must_use]
    pub fn with_greeting(mut self, reply: Reply) -> Self {
        self.script.greeting = Some(reply);
        self
    }

    /// Close the connection without a greeting.
    #[must_use]
    pub fn silent(mut self) -> Self {
        self.script.greeting = None;
        self
    }

    /// Send these bytes instead of a greeting and close.
    #[must_use]
    pub fn with_raw_greeting(mut self, raw: &[u8]) -> Self {
        self.script.raw_greeting = Some(raw.to_vec());
        self
    }

    #[must_use]
    pub fn with_ehlo(mut self, reply: Reply) -> Self {
        self.script.ehlo = reply;
        self
    }

    #[must_use]
    pub fn with_starttls(mut self, reply: Reply) -> Self {
        self.script.starttls = reply;
        self
    }

    pub async fn build(self) -> std::io::Result<MockSmtpServer> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let script = Arc::new(self.script);
        let commands = Arc::new(Mutex::new(Vec::new()));

        let accepted = Arc::clone(&commands);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let script = Arc::clone(&script);
                let commands = Arc::clone(&accepted);
                tokio::spawn(async move {
                    let _ = MockSmtpServer::handle_client(stream, script, commands).await;
                });
            }
        });

        Ok(MockSmtpServer { addr, commands })
    }
}
