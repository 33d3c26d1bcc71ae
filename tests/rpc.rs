use std::io;
use std::time::Duration;

mod support;

use nfs_boot::protocol::nfs::mount::{mountproc3_mnt, mountproc3_umnt};
use nfs_boot::protocol::nfs::portmap::pmapproc_getport;
use nfs_boot::protocol::nfs::v3::{nfsproc3_getattr, nfsproc3_lookup, nfsproc3_readlink};
use nfs_boot::protocol::rpc::{
    Clock, PacketQueue, Program, RpcClient, Transport, MAX_ATTEMPTS, RPC_TIMEOUT,
};
use nfs_boot::xdr::mount::mountstat3;
use nfs_boot::xdr::nfs3::{self, nfsstat3, NFSProgram};
use nfs_boot::xdr::rpc::{
    accept_body, accepted_reply, auth_stat, make_accepted_reply, make_denied_reply, opaque_auth,
    rejected_reply, reply_body, rpc_body, rpc_msg,
};
use nfs_boot::xdr::{mount, portmap};
use nfs_boot::{Error, FileType};

use support::{encode, reply_with, words, FixtureServer, ManualClock, MOUNT_PORT, NFS_PORT, ROOT_ID};

const TICK: Duration = Duration::from_millis(100);

fn client(server: &mut FixtureServer) -> RpcClient<&mut FixtureServer> {
    let mut rpc = RpcClient::new(server);
    rpc.set_mount_port(MOUNT_PORT);
    rpc.set_nfs_port(NFS_PORT);
    rpc
}

fn clocked_client<'a>(
    server: &'a mut FixtureServer,
    clock: &ManualClock,
) -> RpcClient<&'a mut FixtureServer> {
    let mut rpc = RpcClient::with_clock(server, Box::new(clock.clone()));
    rpc.set_mount_port(MOUNT_PORT);
    rpc.set_nfs_port(NFS_PORT);
    rpc
}

fn root() -> nfs3::nfs_fh3 {
    FixtureServer::handle(ROOT_ID)
}

#[test]
fn call_header_and_credentials_layout() {
    let mut server = FixtureServer::sample();
    let mut rpc = client(&mut server);
    rpc.set_xid(41);

    nfsproc3_getattr(&mut rpc, &root()).expect("getattr");
    drop(rpc);

    let call = &server.calls[0];
    assert_eq!(call.port, NFS_PORT);
    let expected = words(&[
        42, 0, 2, 100003, 3, 1, // call header
        1, 20, 0, 0, 0, 0, 0, // AUTH_UNIX credential
        0, 0, // AUTH_NONE verifier
        8, 0, 1, // file handle: length 8, id 1
    ]);
    assert_eq!(call.datagram, expected);
}

#[test]
fn xid_increments_and_wraps() {
    let mut server = FixtureServer::sample();
    let mut rpc = client(&mut server);
    rpc.set_xid(u32::MAX - 1);

    for _ in 0..3 {
        nfsproc3_getattr(&mut rpc, &root()).expect("getattr");
    }
    assert_eq!(rpc.xid(), 1);
    drop(rpc);

    let xids: Vec<u32> = server.calls.iter().map(|c| c.xid).collect();
    assert_eq!(xids, [u32::MAX, 0, 1]);
}

#[test]
fn stale_and_malformed_packets_are_ignored() {
    let mut server = FixtureServer::sample();
    server.noise = true;
    let mut rpc = client(&mut server);

    let attrs = nfsproc3_getattr(&mut rpc, &root()).expect("getattr");
    assert_eq!(attrs.file_type, FileType::Directory);
    let (_, attrs) = nfsproc3_lookup(&mut rpc, &root(), b"initrd.img").expect("lookup");
    assert_eq!(attrs.map(|a| a.size), Some(5));
    drop(rpc);

    assert_eq!(server.calls.len(), 2, "no retransmissions expected");
}

#[test]
fn retransmits_identical_datagram_after_timeout() {
    let clock = ManualClock::new();
    let mut server = FixtureServer::sample().with_clock(&clock, TICK);
    server.drop_calls = 2;
    let mut rpc = clocked_client(&mut server, &clock);

    nfsproc3_getattr(&mut rpc, &root()).expect("answered on the third transmission");
    drop(rpc);

    assert_eq!(server.calls.len(), 3);
    let first = &server.calls[0];
    for (prev, call) in server.calls.iter().zip(&server.calls[1..]) {
        assert_eq!(call.datagram, first.datagram);
        assert!(call.sent_at - prev.sent_at >= RPC_TIMEOUT);
    }
}

#[test]
fn gives_up_after_max_attempts() {
    let clock = ManualClock::new();
    let mut server = FixtureServer::sample().with_clock(&clock, TICK);
    server.silent = true;
    let mut rpc = clocked_client(&mut server, &clock);

    let err = nfsproc3_getattr(&mut rpc, &root()).expect_err("no reply");
    assert!(matches!(err, Error::Timeout { attempts: 5 }), "unexpected error: {err:?}");
    assert_eq!(err.io_kind(), io::ErrorKind::TimedOut);
    drop(rpc);

    assert_eq!(server.calls.len(), MAX_ATTEMPTS as usize);
    let span = server.calls[4].sent_at - server.calls[0].sent_at;
    assert!(span >= RPC_TIMEOUT * 4);
    assert!(clock.now() >= RPC_TIMEOUT * MAX_ATTEMPTS);
}

#[test]
fn denied_reply_is_final() {
    let mut server = FixtureServer::sample();
    server.scripted.push_back(Box::new(|xid| {
        encode(&make_denied_reply(xid, rejected_reply::AUTH_ERROR(auth_stat::AUTH_TOOWEAK)))
    }));
    let mut rpc = client(&mut server);

    let err = nfsproc3_getattr(&mut rpc, &root()).expect_err("denied");
    assert!(matches!(err, Error::RpcDenied(1)), "unexpected error: {err:?}");
    drop(rpc);
    assert_eq!(server.calls.len(), 1);
}

#[test]
fn unsuccessful_accept_stat_is_final() {
    let mut server = FixtureServer::sample();
    server.scripted.push_back(Box::new(|xid| encode(&make_accepted_reply(xid, accept_body::PROG_UNAVAIL))));
    let mut rpc = client(&mut server);

    let err = nfsproc3_getattr(&mut rpc, &root()).expect_err("rejected");
    assert!(matches!(err, Error::RpcRejected { stat: 1 }), "unexpected error: {err:?}");
    drop(rpc);
    assert_eq!(server.calls.len(), 1);
}

#[test]
fn nfs_status_is_surfaced_without_retry() {
    let mut server = FixtureServer::sample();
    let mut rpc = client(&mut server);

    let err = nfsproc3_lookup(&mut rpc, &root(), b"missing").expect_err("no such entry");
    assert!(err.is_nfs(nfsstat3::NFS3ERR_NOENT), "unexpected error: {err:?}");
    assert_eq!(io::Error::from(err).kind(), io::ErrorKind::NotFound);
    drop(rpc);
    assert_eq!(server.calls.len(), 1);
}

#[test]
fn unknown_nfs_status_is_kept() {
    let mut server = FixtureServer::sample();
    server.scripted.push_back(Box::new(|xid| reply_with(xid, &words(&[12345, 0]))));
    let mut rpc = client(&mut server);

    let err = nfsproc3_getattr(&mut rpc, &root()).expect_err("bad status");
    assert!(matches!(err, Error::NfsUnknown(12345)), "unexpected error: {err:?}");
}

#[test]
fn unknown_verifier_flavor_is_accepted() {
    let mut server = FixtureServer::sample();
    server.scripted.push_back(Box::new(|xid| {
        let verf = opaque_auth { flavor: 4, body: vec![0xDE, 0xAD, 0xBE, 0xEF] };
        let reply = accepted_reply { verf, reply_data: accept_body::SUCCESS };
        let mut out = encode(&rpc_msg { xid, body: rpc_body::REPLY(reply_body::MSG_ACCEPTED(reply)) });
        // NFS3_OK, no attributes, 4 byte target
        out.extend_from_slice(&words(&[0, 0, 4]));
        out.extend_from_slice(b"abcd");
        out
    }));
    let mut rpc = client(&mut server);

    let target = nfsproc3_readlink(&mut rpc, &root()).expect("flavor is not checked");
    assert_eq!(target, "abcd");
}

#[test]
fn truncated_reply_is_a_decode_error() {
    let mut server = FixtureServer::sample();
    // status OK followed by half of a fattr3
    server.scripted.push_back(Box::new(|xid| reply_with(xid, &words(&[0, 2, 0o755, 1]))));
    let mut rpc = client(&mut server);

    let err = nfsproc3_getattr(&mut rpc, &root()).expect_err("truncated");
    assert!(matches!(err, Error::Decode(_)), "unexpected error: {err:?}");
    assert_eq!(err.io_kind(), io::ErrorKind::InvalidData);
}

#[test]
fn unconfigured_port_fails_before_sending() {
    let mut server = FixtureServer::sample();
    let mut rpc = RpcClient::new(&mut server);

    let err = nfsproc3_getattr(&mut rpc, &root()).expect_err("no NFS port");
    assert!(matches!(err, Error::NoUdpPort { program: 100003 }), "unexpected error: {err:?}");
    drop(rpc);
    assert!(server.calls.is_empty());
}

#[test]
fn oversized_request_is_not_sent() {
    let mut server = FixtureServer::sample();
    let mut rpc = client(&mut server).with_request_capacity(16);

    let err = nfsproc3_lookup(&mut rpc, &root(), &[b'x'; 64]).expect_err("too large");
    assert!(matches!(err, Error::RequestTooLarge { capacity: 64 }), "unexpected error: {err:?}");

    // the scratch buffer is still usable afterwards
    nfsproc3_getattr(&mut rpc, &root()).expect("getattr");
    drop(rpc);
    assert_eq!(server.calls.len(), 1);
}

#[test]
fn getport_uses_portmapper_with_auth_none() {
    let mut server = FixtureServer::sample();
    let mut rpc = RpcClient::new(&mut server);
    rpc.set_xid(9);

    let port = pmapproc_getport(&mut rpc, mount::PROGRAM, mount::VERSION).expect("getport");
    assert_eq!(port, MOUNT_PORT);
    drop(rpc);

    let call = &server.calls[0];
    assert_eq!(call.port, portmap::PORT);
    let expected = words(&[
        10, 0, 2, 100000, 2, 3, // call header
        0, 0, 0, 0, // AUTH_NONE credential and verifier
        100005, 3, 17, 0, // mapping
    ]);
    assert_eq!(call.datagram, expected);
}

#[test]
fn getport_without_udp_registration() {
    let mut server = FixtureServer::sample();
    server.registrations.remove(&nfs3::PROGRAM);
    let mut rpc = RpcClient::new(&mut server);

    let err = pmapproc_getport(&mut rpc, nfs3::PROGRAM, nfs3::VERSION).expect_err("not registered");
    assert!(matches!(err, Error::NoUdpPort { program: 100003 }), "unexpected error: {err:?}");
    assert!(err.to_string().contains("TCP only?"));
}

#[test]
fn getport_rejects_out_of_range_port() {
    let mut server = FixtureServer::sample();
    server.registrations.insert(mount::PROGRAM, 70000);
    let mut rpc = RpcClient::new(&mut server);

    let err = pmapproc_getport(&mut rpc, mount::PROGRAM, mount::VERSION).expect_err("bad port");
    assert!(matches!(err, Error::ProtocolViolation(_)), "unexpected error: {err:?}");
}

#[test]
fn mnt_returns_root_handle() {
    let mut server = FixtureServer::sample();
    let mut rpc = client(&mut server);

    let fh = mountproc3_mnt(&mut rpc, "/export").expect("mnt");
    assert_eq!(fh, root());
    mountproc3_umnt(&mut rpc, "/export").expect("umnt");
    drop(rpc);

    assert_eq!(server.calls_to(mount::PROGRAM, 1)[0].port, MOUNT_PORT);
    assert_eq!(server.unmounted, ["/export"]);
}

#[test]
fn mnt_failure_status() {
    let mut server = FixtureServer::sample();
    let mut rpc = client(&mut server);

    let err = mountproc3_mnt(&mut rpc, "/nope").expect_err("not exported");
    assert!(matches!(err, Error::Mount(mountstat3::MNT3ERR_NOENT)), "unexpected error: {err:?}");
    assert_eq!(err.io_kind(), io::ErrorKind::NotFound);
}

#[test]
fn mnt_path_too_long() {
    let mut server = FixtureServer::sample();
    let mut rpc = client(&mut server);

    let path = format!("/{}", "a".repeat(mount::MNTPATHLEN));
    let err = mountproc3_mnt(&mut rpc, &path).expect_err("path too long");
    assert!(matches!(err, Error::InvalidPath(_)), "unexpected error: {err:?}");
    drop(rpc);
    assert!(server.calls.is_empty());
}

#[test]
fn procedure_numbers() {
    let mut server = FixtureServer::sample();
    let mut rpc = client(&mut server);
    nfsproc3_lookup(&mut rpc, &root(), b"boot").expect("lookup");
    drop(rpc);

    let call = &server.calls[0];
    assert_eq!((call.prog, call.vers, call.proc), (100003, 3, NFSProgram::NFSPROC3_LOOKUP as u32));
    assert_eq!(Program::Mount.number(), 100005);
    assert_eq!(Program::Portmap.version(), 2);
}

/// Fails the first `failures` sends, then behaves like the fixture.
struct FlakySend<'a> {
    inner: &'a mut FixtureServer,
    failures: usize,
}

impl Transport for FlakySend<'_> {
    fn send(&mut self, port: u16, datagram: &[u8]) -> io::Result<()> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(io::Error::new(io::ErrorKind::Other, "network unreachable"));
        }
        self.inner.send(port, datagram)
    }

    fn poll(&mut self, queue: &mut PacketQueue) -> io::Result<()> {
        self.inner.poll(queue)
    }
}

#[test]
fn send_errors_are_retried() {
    let clock = ManualClock::new();
    let mut server = FixtureServer::sample().with_clock(&clock, TICK);
    let transport = FlakySend { inner: &mut server, failures: 1 };
    let mut rpc = RpcClient::with_clock(transport, Box::new(clock.clone()));
    rpc.set_nfs_port(NFS_PORT);

    nfsproc3_getattr(&mut rpc, &root()).expect("second transmission succeeds");
    drop(rpc);
    assert_eq!(server.calls.len(), 1);
}

struct BrokenPoll;

impl Transport for BrokenPoll {
    fn send(&mut self, _port: u16, _datagram: &[u8]) -> io::Result<()> {
        Ok(())
    }

    fn poll(&mut self, _queue: &mut PacketQueue) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "socket closed"))
    }
}

#[test]
fn poll_errors_are_fatal() {
    let mut rpc = RpcClient::new(BrokenPoll);
    rpc.set_nfs_port(NFS_PORT);

    let err = nfsproc3_getattr(&mut rpc, &root()).expect_err("poll fails");
    assert!(matches!(err, Error::Transport(_)), "unexpected error: {err:?}");
    assert_eq!(io::Error::from(err).kind(), io::ErrorKind::BrokenPipe);
}
