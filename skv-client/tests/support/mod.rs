//! In-process RESP2 server for integration tests.
//!
//! Understands just the commands the client issues, keeps its data in one
//! shared in-memory store, and can drop the first connection after a given
//! number of commands to simulate a broken link.

use std::collections::{BTreeSet, HashMap};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use skv_client::{ClientConfig, SyncClient};

pub struct TestServer {
    pub addr: String,
    accepted: Arc<AtomicUsize>,
}

impl TestServer {
    /// Number of connections accepted so far.
    pub fn connections(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn client(&self) -> SyncClient {
        let config = ClientConfig {
            addr: self.addr.clone(),
            connect_timeout: Duration::from_secs(1),
            read_timeout: Some(Duration::from_secs(2)),
            write_timeout: Some(Duration::from_secs(2)),
        };
        SyncClient::with_config(config).expect("client")
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Starts a server. With `drop_first_after = Some(n)` the first connection
/// answers `n` commands, reads the next one and closes without replying.
pub fn spawn_server(drop_first_after: Option<usize>) -> TestServer {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr").to_string();
    let accepted = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(Mutex::new(Store::default()));

    let counter = accepted.clone();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { return };
            let idx = counter.fetch_add(1, Ordering::SeqCst);
            let limit = if idx == 0 { drop_first_after } else { None };
            let store = store.clone();
            thread::spawn(move || serve(stream, store, limit));
        }
    });

    TestServer { addr, accepted }
}

fn serve(stream: TcpStream, store: Arc<Mutex<Store>>, limit: Option<usize>) {
    let mut writer = stream.try_clone().expect("clone");
    let mut reader = BufReader::new(stream);
    let mut handled = 0;
    while let Ok(Some(args)) = read_command(&mut reader) {
        if limit == Some(handled) {
            return;
        }
        let response = store.lock().expect("store lock").dispatch(&args);
        if writer.write_all(&response).and_then(|_| writer.flush()).is_err() {
            return;
        }
        handled += 1;
    }
}

fn read_command(reader: &mut BufReader<TcpStream>) -> std::io::Result<Option<Vec<Vec<u8>>>> {
    let mut line = Vec::new();
    if read_line(reader, &mut line)?.is_none() {
        return Ok(None);
    }
    if line.first() != Some(&b'*') {
        return Err(invalid("expected array"));
    }
    let count = parse_usize(&line[1..])?;
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        read_line(reader, &mut line)?.ok_or_else(|| invalid("eof"))?;
        if line.first() != Some(&b'$') {
            return Err(invalid("expected bulk"));
        }
        let len = parse_usize(&line[1..])?;
        let mut data = vec![0u8; len];
        reader.read_exact(&mut data)?;
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf)?;
        if crlf != [b'\r', b'\n'] {
            return Err(invalid("missing crlf"));
        }
        args.push(data);
    }
    Ok(Some(args))
}

fn read_line(reader: &mut BufReader<TcpStream>, buf: &mut Vec<u8>) -> std::io::Result<Option<()>> {
    buf.clear();
    let bytes = reader.read_until(b'\n', buf)?;
    if bytes == 0 {
        return Ok(None);
    }
    if buf.len() < 2 || buf[buf.len() - 2] != b'\r' {
        return Err(invalid("invalid line"));
    }
    buf.truncate(buf.len() - 2);
    Ok(Some(()))
}

fn parse_usize(data: &[u8]) -> std::io::Result<usize> {
    std::str::from_utf8(data)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| invalid("digit"))
}

fn invalid(msg: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, msg.to_string())
}

fn simple(msg: &str) -> Vec<u8> {
    format!("+{msg}\r\n").into_bytes()
}

fn error(msg: &str) -> Vec<u8> {
    format!("-{msg}\r\n").into_bytes()
}

fn integer(value: i64) -> Vec<u8> {
    format!(":{value}\r\n").into_bytes()
}

fn nil() -> Vec<u8> {
    b"$-1\r\n".to_vec()
}

fn bulk(data: &[u8]) -> Vec<u8> {
    let mut out = format!("${}\r\n", data.len()).into_bytes();
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
    out
}

fn array(items: Vec<Vec<u8>>) -> Vec<u8> {
    let mut out = format!("*{}\r\n", items.len()).into_bytes();
    for item in items {
        out.extend(item);
    }
    out
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_secs() as i64
}

fn parse_i64(data: &[u8]) -> Option<i64> {
    std::str::from_utf8(data).ok()?.parse().ok()
}

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

enum Value {
    Str(Vec<u8>),
    Set(BTreeSet<Vec<u8>>),
    Hash(HashMap<Vec<u8>, Vec<u8>>),
}

#[derive(Default)]
struct Store {
    data: HashMap<Vec<u8>, Value>,
    expires: HashMap<Vec<u8>, i64>,
}

impl Store {
    fn dispatch(&mut self, args: &[Vec<u8>]) -> Vec<u8> {
        let Some(name) = args.first() else {
            return error("ERR empty command");
        };
        let name = String::from_utf8_lossy(name).to_ascii_uppercase();
        let rest = &args[1..];
        let arity_ok = match name.as_str() {
            "PING" => rest.len() <= 1,
            "SELECT" | "GET" | "TTL" | "SCARD" => rest.len() == 1,
            "EXPIRE" | "EXPIREAT" | "SISMEMBER" => rest.len() == 2,
            "SET" => rest.len() >= 2,
            "SADD" | "SDIFFSTORE" | "SINTERSTORE" | "HMGET" => rest.len() >= 2,
            "SDIFF" | "SINTER" => !rest.is_empty(),
            "HMSET" => rest.len() >= 3 && rest.len() % 2 == 1,
            _ => return error(&format!("ERR unknown command '{name}'")),
        };
        if !arity_ok {
            return error(&format!(
                "ERR wrong number of arguments for '{}' command",
                name.to_ascii_lowercase()
            ));
        }
        for key in rest.iter().take(1) {
            self.purge(key);
        }

        match name.as_str() {
            "PING" => match rest.first() {
                Some(msg) => bulk(msg),
                None => simple("PONG"),
            },
            "SELECT" => match parse_i64(&rest[0]) {
                Some(idx) if (0..16).contains(&idx) => simple("OK"),
                _ => error("ERR DB index is out of range"),
            },
            "GET" => match self.data.get(&rest[0]) {
                Some(Value::Str(data)) => bulk(data),
                Some(_) => error(WRONGTYPE),
                None => nil(),
            },
            "SET" => self.set(rest),
            "EXPIRE" | "EXPIREAT" => {
                let Some(mut at) = parse_i64(&rest[1]) else {
                    return error("ERR value is not an integer or out of range");
                };
                if name == "EXPIRE" {
                    at += now();
                }
                if !self.data.contains_key(&rest[0]) {
                    return integer(0);
                }
                if at <= now() {
                    self.data.remove(&rest[0]);
                    self.expires.remove(&rest[0]);
                } else {
                    self.expires.insert(rest[0].clone(), at);
                }
                integer(1)
            }
            "TTL" => match (self.data.contains_key(&rest[0]), self.expires.get(&rest[0])) {
                (false, _) => integer(-2),
                (true, None) => integer(-1),
                (true, Some(at)) => integer(at - now()),
            },
            "SADD" => match self.set_entry(&rest[0]) {
                Some(set) => integer(rest[1..].iter().filter(|m| set.insert(m.to_vec())).count() as i64),
                None => error(WRONGTYPE),
            },
            "SCARD" => match self.data.get(&rest[0]) {
                Some(Value::Set(set)) => integer(set.len() as i64),
                Some(_) => error(WRONGTYPE),
                None => integer(0),
            },
            "SISMEMBER" => match self.data.get(&rest[0]) {
                Some(Value::Set(set)) => integer(set.contains(&rest[1]) as i64),
                Some(_) => error(WRONGTYPE),
                None => integer(0),
            },
            "SDIFF" | "SINTER" => match self.combine(&name, rest) {
                Ok(members) => array(members.iter().map(|m| bulk(m)).collect()),
                Err(resp) => resp,
            },
            "SDIFFSTORE" | "SINTERSTORE" => {
                let op = name.trim_end_matches("STORE").to_string();
                match self.combine(&op, &rest[1..]) {
                    Ok(members) => {
                        let count = members.len() as i64;
                        self.expires.remove(&rest[0]);
                        if members.is_empty() {
                            self.data.remove(&rest[0]);
                        } else {
                            self.data.insert(rest[0].clone(), Value::Set(members));
                        }
                        integer(count)
                    }
                    Err(resp) => resp,
                }
            }
            "HMGET" => match self.data.get(&rest[0]) {
                Some(Value::Hash(hash)) => array(
                    rest[1..]
                        .iter()
                        .map(|field| hash.get(field).map_or_else(nil, |v| bulk(v)))
                        .collect(),
                ),
                Some(_) => error(WRONGTYPE),
                None => array(rest[1..].iter().map(|_| nil()).collect()),
            },
            "HMSET" => {
                let entry = self
                    .data
                    .entry(rest[0].clone())
                    .or_insert_with(|| Value::Hash(HashMap::new()));
                let Value::Hash(hash) = entry else {
                    return error(WRONGTYPE);
                };
                for pair in rest[1..].chunks(2) {
                    hash.insert(pair[0].clone(), pair[1].clone());
                }
                simple("OK")
            }
            _ => error("ERR unreachable"),
        }
    }

    fn purge(&mut self, key: &[u8]) {
        if matches!(self.expires.get(key), Some(&at) if at <= now()) {
            self.expires.remove(key);
            self.data.remove(key);
        }
    }

    fn set(&mut self, rest: &[Vec<u8>]) -> Vec<u8> {
        let (key, value) = (&rest[0], &rest[1]);
        let mut ttl = None;
        let mut nx = false;
        let mut xx = false;
        let mut opts = rest[2..].iter();
        while let Some(opt) = opts.next() {
            match opt.to_ascii_uppercase().as_slice() {
                b"NX" => nx = true,
                b"XX" => xx = true,
                b"EX" => match opts.next().and_then(|v| parse_i64(v)) {
                    Some(secs) if secs > 0 => ttl = Some(secs),
                    _ => return error("ERR invalid expire time in 'set' command"),
                },
                _ => return error("ERR syntax error"),
            }
        }
        let exists = self.data.contains_key(key);
        if (nx && exists) || (xx && !exists) {
            return nil();
        }
        self.data.insert(key.clone(), Value::Str(value.clone()));
        match ttl {
            Some(secs) => self.expires.insert(key.clone(), now() + secs),
            None => self.expires.remove(key),
        };
        simple("OK")
    }

    fn set_entry(&mut self, key: &[u8]) -> Option<&mut BTreeSet<Vec<u8>>> {
        let entry = self
            .data
            .entry(key.to_vec())
            .or_insert_with(|| Value::Set(BTreeSet::new()));
        match entry {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    fn members(&mut self, key: &[u8]) -> Result<BTreeSet<Vec<u8>>, Vec<u8>> {
        self.purge(key);
        match self.data.get(key) {
            Some(Value::Set(set)) => Ok(set.clone()),
            Some(_) => Err(error(WRONGTYPE)),
            None => Ok(BTreeSet::new()),
        }
    }

    fn combine(&mut self, op: &str, keys: &[Vec<u8>]) -> Result<BTreeSet<Vec<u8>>, Vec<u8>> {
        let mut result = self.members(&keys[0])?;
        for key in &keys[1..] {
            let other = self.members(key)?;
            result = if op == "SDIFF" {
                result.difference(&other).cloned().collect()
            } else {
                result.intersection(&other).cloned().collect()
            };
        }
        Ok(result)
    }
}
