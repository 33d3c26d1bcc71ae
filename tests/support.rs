#![allow(dead_code)]

//! In-memory PORTMAP / MOUNT / NFS server speaking the wire protocol, used as
//! the transport under test.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io;
use std::rc::Rc;
use std::time::Duration;

use nfs_boot::protocol::rpc::{Clock, Packet, PacketQueue, Transport};
use nfs_boot::xdr::mount::{self, mountstat3};
use nfs_boot::xdr::nfs3::dir::{entry3, LOOKUP3resok, READDIR3args};
use nfs_boot::xdr::nfs3::file::{READ3args, READ3resok, READLINK3resok};
use nfs_boot::xdr::nfs3::{
    self, diropargs3, fattr3, ftype3, nfs_fh3, nfsstat3, nfstime3, post_op_attr,
};
use nfs_boot::xdr::portmap::{self, mapping};
use nfs_boot::xdr::rpc::{make_success_reply, rpc_body, rpc_msg};
use nfs_boot::xdr::{deserialize, Serialize, XdrCursor};

pub const MOUNT_PORT: u16 = 635;
pub const NFS_PORT: u16 = 2049;
pub const ROOT_ID: u64 = 1;

/// Clock advanced by hand, shared between a test and the client under test.
#[derive(Clone, Default)]
pub struct ManualClock(Rc<Cell<Duration>>);

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.0.get()
    }
}

pub enum Node {
    Dir(Vec<(Vec<u8>, u64)>),
    File(Vec<u8>),
    Symlink(String),
}

/// A call as seen by the server.
#[derive(Clone, Debug)]
pub struct Call {
    pub port: u16,
    pub xid: u32,
    pub prog: u32,
    pub vers: u32,
    pub proc: u32,
    /// Clock time at which the datagram was sent.
    pub sent_at: Duration,
    pub datagram: Vec<u8>,
}

impl Call {
    /// Everything after the 24-byte call header.
    pub fn args(&self) -> &[u8] {
        &self.datagram[24..]
    }
}

type ScriptedReply = Box<dyn FnOnce(u32) -> Vec<u8>>;

pub struct FixtureServer {
    nodes: BTreeMap<u64, Node>,
    next_id: u64,
    outbox: VecDeque<Packet>,
    pub calls: Vec<Call>,
    /// Cookie and verifier of each READDIR request received.
    pub readdir_requests: Vec<(u64, [u8; 8])>,
    pub clock: Option<(ManualClock, Duration)>,
    /// Ports registered with the portmapper, by program.
    pub registrations: HashMap<u32, u32>,
    /// Number of upcoming calls to swallow without answering.
    pub drop_calls: usize,
    /// Swallow every call.
    pub silent: bool,
    /// Queue stale and malformed packets ahead of every reply.
    pub noise: bool,
    pub page_entries: usize,
    /// Change the cookie verifier on every READDIR page.
    pub rotate_verifier: bool,
    verifier_generation: u8,
    /// Leave attributes out of LOOKUP and READ replies.
    pub omit_attributes: bool,
    /// Largest READ reply, in bytes.
    pub read_limit: usize,
    /// Errors to return for NFS procedures.
    pub nfs_errors: HashMap<u32, nfsstat3>,
    pub mount_error: Option<mountstat3>,
    /// Replies used, in order, instead of the regular ones.
    pub scripted: VecDeque<ScriptedReply>,
    pub exports: Vec<String>,
    pub unmounted: Vec<String>,
}

impl Default for FixtureServer {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureServer {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(ROOT_ID, Node::Dir(Vec::new()));
        let registrations = HashMap::from([
            (mount::PROGRAM, u32::from(MOUNT_PORT)),
            (nfs3::PROGRAM, u32::from(NFS_PORT)),
        ]);
        Self {
            nodes,
            next_id: ROOT_ID + 1,
            outbox: VecDeque::new(),
            calls: Vec::new(),
            readdir_requests: Vec::new(),
            clock: None,
            registrations,
            drop_calls: 0,
            silent: false,
            noise: false,
            page_entries: 8,
            rotate_verifier: false,
            verifier_generation: 0,
            omit_attributes: false,
            read_limit: usize::MAX,
            nfs_errors: HashMap::new(),
            mount_error: None,
            scripted: VecDeque::new(),
            exports: vec!["/export".to_string()],
            unmounted: Vec::new(),
        }
    }

    /// The tree used by most tests:
    ///
    /// ```text
    /// /boot/vmlinuz      3000 bytes
    /// /boot/initrd       -> ../initrd.img
    /// /initrd.img        5 bytes
    /// /etc/hostname      "fixture\n"
    /// /etc/motd          -> /etc/hostname
    /// /empty/
    /// /current           -> boot
    /// ```
    pub fn sample() -> Self {
        let mut server = Self::new();
        let boot = server.add_dir(ROOT_ID, "boot");
        server.add_file(boot, "vmlinuz", &pattern(3000));
        server.add_symlink(boot, "initrd", "../initrd.img");
        server.add_file(ROOT_ID, "initrd.img", b"initr");
        let etc = server.add_dir(ROOT_ID, "etc");
        server.add_file(etc, "hostname", b"fixture\n");
        server.add_symlink(etc, "motd", "/etc/hostname");
        server.add_dir(ROOT_ID, "empty");
        server.add_symlink(ROOT_ID, "current", "boot");
        server
    }

    pub fn with_clock(mut self, clock: &ManualClock, tick: Duration) -> Self {
        self.clock = Some((clock.clone(), tick));
        self
    }

    fn add(&mut self, parent: u64, name: &[u8], node: Node) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, node);
        match self.nodes.get_mut(&parent) {
            Some(Node::Dir(entries)) => entries.push((name.to_vec(), id)),
            _ => panic!("parent {parent} is not a directory"),
        }
        id
    }

    pub fn add_dir(&mut self, parent: u64, name: &str) -> u64 {
        self.add(parent, name.as_bytes(), Node::Dir(Vec::new()))
    }

    pub fn add_file(&mut self, parent: u64, name: &str, data: &[u8]) -> u64 {
        self.add(parent, name.as_bytes(), Node::File(data.to_vec()))
    }

    pub fn add_raw_file(&mut self, parent: u64, name: &[u8], data: &[u8]) -> u64 {
        self.add(parent, name, Node::File(data.to_vec()))
    }

    pub fn add_symlink(&mut self, parent: u64, name: &str, target: &str) -> u64 {
        self.add(parent, name.as_bytes(), Node::Symlink(target.to_string()))
    }

    pub fn handle(id: u64) -> nfs_fh3 {
        nfs_fh3::new(&id.to_be_bytes()).expect("8-byte handle")
    }

    pub fn calls_to(&self, prog: u32, proc: u32) -> Vec<&Call> {
        self.calls.iter().filter(|c| c.prog == prog && c.proc == proc).collect()
    }

    pub fn nfs_calls(&self) -> usize {
        self.calls.iter().filter(|c| c.prog == nfs3::PROGRAM).count()
    }

    fn now(&self) -> Duration {
        self.clock.as_ref().map(|(clock, _)| clock.now()).unwrap_or_default()
    }

    fn attrs(&self, id: u64) -> fattr3 {
        let (ftype, mode, size) = match &self.nodes[&id] {
            Node::Dir(_) => (ftype3::NF3DIR, 0o755, 4096),
            Node::File(data) => (ftype3::NF3REG, 0o644, data.len() as u64),
            Node::Symlink(target) => (ftype3::NF3LNK, 0o777, target.len() as u64),
        };
        fattr3 {
            ftype,
            mode,
            nlink: 1,
            uid: 0,
            gid: 0,
            size,
            used: size,
            fileid: id,
            mtime: nfstime3 { seconds: 1_700_000_000, nseconds: 0 },
            ..Default::default()
        }
    }

    fn post_op(&self, id: u64) -> post_op_attr {
        if self.omit_attributes {
            post_op_attr::Void
        } else {
            post_op_attr::attributes(self.attrs(id))
        }
    }

    fn handle_call(&mut self, port: u16, datagram: &[u8]) -> Option<Vec<u8>> {
        let mut src = XdrCursor::new(datagram);
        let msg = deserialize::<rpc_msg>(&mut src).ok()?;
        let rpc_body::CALL(call) = msg.body else {
            return None;
        };
        let (xid, prog, vers, proc) = (msg.xid, call.prog, call.vers, call.proc);
        self.calls.push(Call {
            port,
            xid,
            prog,
            vers,
            proc,
            sent_at: self.now(),
            datagram: datagram.to_vec(),
        });

        if self.silent {
            return None;
        }
        if self.drop_calls > 0 {
            self.drop_calls -= 1;
            return None;
        }
        if let Some(script) = self.scripted.pop_front() {
            return Some(script(xid));
        }

        let mut out = Vec::new();
        make_success_reply(xid).serialize(&mut out).ok()?;
        match prog {
            portmap::PROGRAM => {
                let query = deserialize::<mapping>(&mut src).ok()?;
                let port = self.registrations.get(&query.prog).copied().unwrap_or(0);
                port.serialize(&mut out).ok()?;
            }
            mount::PROGRAM => self.mount_proc(proc, &mut src, &mut out)?,
            nfs3::PROGRAM => self.nfs_proc(proc, &mut src, &mut out)?,
            _ => return None,
        }
        Some(out)
    }

    fn mount_proc(&mut self, proc: u32, src: &mut XdrCursor<'_>, out: &mut Vec<u8>) -> Option<()> {
        let path = String::from_utf8(src.decode_opaque(1024).ok()?.to_vec()).ok()?;
        match proc {
            1 => {
                let stat = match self.mount_error {
                    Some(stat) => stat,
                    None if self.exports.contains(&path) => mountstat3::MNT3_OK,
                    None => mountstat3::MNT3ERR_NOENT,
                };
                stat.serialize(out).ok()?;
                if stat == mountstat3::MNT3_OK {
                    Self::handle(ROOT_ID).serialize(out).ok()?;
                    // auth flavors: AUTH_UNIX
                    [1_u32, 1].serialize(out).ok()?;
                }
            }
            3 => self.unmounted.push(path),
            _ => return None,
        }
        Some(())
    }

    fn nfs_proc(&mut self, proc: u32, src: &mut XdrCursor<'_>, out: &mut Vec<u8>) -> Option<()> {
        // every procedure here takes the object handle first
        let fh = deserialize::<nfs_fh3>(&mut src.clone()).ok()?;
        let id = u64::from_be_bytes(fh.as_bytes().try_into().ok()?);

        let result = match self.nfs_errors.get(&proc) {
            Some(stat) => Err(*stat),
            None if !self.nodes.contains_key(&id) => Err(nfsstat3::NFS3ERR_STALE),
            None => Ok(()),
        };
        if let Err(stat) = result {
            stat.serialize(out).ok()?;
            false.serialize(out).ok()?;
            return Some(());
        }

        let mut body = Vec::new();
        let stat = match proc {
            1 => {
                deserialize::<nfs_fh3>(src).ok()?;
                self.attrs(id).serialize(&mut body).ok()?;
                nfsstat3::NFS3_OK
            }
            3 => {
                let args = deserialize::<diropargs3>(src).ok()?;
                match &self.nodes[&id] {
                    Node::Dir(entries) => match entries.iter().find(|(n, _)| *n == args.name) {
                        Some((_, child)) => {
                            let resok = LOOKUP3resok {
                                object: Self::handle(*child),
                                obj_attributes: self.post_op(*child),
                                dir_attributes: self.post_op(id),
                            };
                            resok.serialize(&mut body).ok()?;
                            nfsstat3::NFS3_OK
                        }
                        None => nfsstat3::NFS3ERR_NOENT,
                    },
                    _ => nfsstat3::NFS3ERR_NOTDIR,
                }
            }
            5 => match &self.nodes[&id] {
                Node::Symlink(target) => {
                    let resok = READLINK3resok {
                        symlink_attributes: self.post_op(id),
                        data: target.as_bytes().to_vec(),
                    };
                    resok.serialize(&mut body).ok()?;
                    nfsstat3::NFS3_OK
                }
                _ => nfsstat3::NFS3ERR_INVAL,
            },
            6 => {
                let args = deserialize::<READ3args>(src).ok()?;
                match &self.nodes[&id] {
                    Node::File(data) => {
                        let count = (args.count as usize).min(self.read_limit);
                        let start = (args.offset as usize).min(data.len());
                        let end = (start + count).min(data.len());
                        let resok = READ3resok {
                            file_attributes: self.post_op(id),
                            count: (end - start) as u32,
                            eof: end == data.len(),
                            data: data[start..end].to_vec(),
                        };
                        resok.serialize(&mut body).ok()?;
                        nfsstat3::NFS3_OK
                    }
                    Node::Dir(_) => nfsstat3::NFS3ERR_ISDIR,
                    Node::Symlink(_) => nfsstat3::NFS3ERR_INVAL,
                }
            }
            16 => {
                let args = deserialize::<READDIR3args>(src).ok()?;
                let cookie = args.cookie;
                self.readdir_requests.push((cookie, args.cookieverf));
                if cookie != 0 && self.rotate_verifier {
                    self.verifier_generation = self.verifier_generation.wrapping_add(1);
                }
                let page = match &self.nodes[&id] {
                    Node::Dir(entries) => {
                        let start = (cookie as usize).min(entries.len());
                        let end = (start + self.page_entries).min(entries.len());
                        let page: Vec<entry3> = entries[start..end]
                            .iter()
                            .enumerate()
                            .map(|(i, (name, child))| entry3 {
                                fileid: *child,
                                name: name.clone(),
                                cookie: (start + i + 1) as u64,
                            })
                            .collect();
                        Some((page, end == entries.len()))
                    }
                    _ => None,
                };
                match page {
                    Some((page, eof)) => {
                        self.post_op(id).serialize(&mut body).ok()?;
                        [0xC0_u8, 0x0C, 0, 0, 0, 0, 0, self.verifier_generation]
                            .serialize(&mut body)
                            .ok()?;
                        for entry in page {
                            true.serialize(&mut body).ok()?;
                            entry.serialize(&mut body).ok()?;
                        }
                        false.serialize(&mut body).ok()?;
                        eof.serialize(&mut body).ok()?;
                        nfsstat3::NFS3_OK
                    }
                    None => nfsstat3::NFS3ERR_NOTDIR,
                }
            }
            _ => return None,
        };

        stat.serialize(out).ok()?;
        if stat == nfsstat3::NFS3_OK {
            out.extend_from_slice(&body);
        } else {
            false.serialize(out).ok()?;
        }
        Some(())
    }
}

impl Transport for FixtureServer {
    fn send(&mut self, port: u16, datagram: &[u8]) -> io::Result<()> {
        if let Some(reply) = self.handle_call(port, datagram) {
            if self.noise {
                let xid = u32::from_be_bytes([reply[0], reply[1], reply[2], reply[3]]);
                // stale reply, runt packet, and a CALL carrying the live xid
                let mut stale = reply.clone();
                stale[..4].copy_from_slice(&xid.wrapping_sub(1).to_be_bytes());
                self.outbox.push_back(Packet::new(port, stale));
                self.outbox.push_back(Packet::new(port, vec![0, 0, 0]));
                let mut call = reply.clone();
                call[4..8].copy_from_slice(&0_u32.to_be_bytes());
                self.outbox.push_back(Packet::new(port, call));
            }
            self.outbox.push_back(Packet::new(port, reply));
        }
        Ok(())
    }

    fn poll(&mut self, queue: &mut PacketQueue) -> io::Result<()> {
        if let Some((clock, tick)) = &self.clock {
            clock.advance(*tick);
        }
        while let Some(packet) = self.outbox.pop_front() {
            queue.push(packet);
        }
        Ok(())
    }
}

/// Deterministic file contents.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 251) as u8).collect()
}

/// An accepted reply header for `xid` followed by `body`.
pub fn reply_with(xid: u32, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    make_success_reply(xid).serialize(&mut out).expect("serialize reply");
    out.extend_from_slice(body);
    out
}

/// Serializes an RPC message.
pub fn encode(msg: &rpc_msg) -> Vec<u8> {
    let mut out = Vec::new();
    msg.serialize(&mut out).expect("serialize rpc_msg");
    out
}

pub fn words(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

/// Installs a subscriber so `RUST_LOG`-style output shows up with `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::TRACE).try_init();
}
