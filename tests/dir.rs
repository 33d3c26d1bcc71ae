mod support;

use nfs_boot::protocol::nfs::v3::nfsproc3_readdir;
use nfs_boot::protocol::rpc::RpcClient;
use nfs_boot::xdr::nfs3::nfsstat3;
use nfs_boot::xdr::DecodeError;
use nfs_boot::{DirCursor, DirEntry, Error, MountOptions, NfsMount, ReadDir};

use support::{reply_with, words, FixtureServer, NFS_PORT, ROOT_ID};

fn client(server: &mut FixtureServer) -> RpcClient<&mut FixtureServer> {
    let mut rpc = RpcClient::new(server);
    rpc.set_nfs_port(NFS_PORT);
    rpc
}

fn server_with_entries(count: usize) -> FixtureServer {
    let mut server = FixtureServer::new();
    for i in 0..count {
        server.add_file(ROOT_ID, &format!("file{i:02}"), b"x");
    }
    server
}

fn names(entries: &[DirEntry]) -> Vec<String> {
    entries.iter().map(|e| e.name_lossy().into_owned()).collect()
}

#[test]
fn enumerates_across_pages_in_order() {
    let mut server = server_with_entries(10);
    server.page_entries = 3;
    let mut rpc = client(&mut server);

    let entries: Vec<DirEntry> = ReadDir::new(&mut rpc, FixtureServer::handle(ROOT_ID))
        .collect::<Result<_, _>>()
        .expect("readdir");
    drop(rpc);

    let expected: Vec<String> = (0..10).map(|i| format!("file{i:02}")).collect();
    assert_eq!(names(&entries), expected);
    let cookies: Vec<u64> = entries.iter().map(|e| e.cookie).collect();
    assert_eq!(cookies, (1..=10).collect::<Vec<u64>>());

    // each request resumes from the last cookie handed out
    let requested: Vec<u64> = server.readdir_requests.iter().map(|(cookie, _)| *cookie).collect();
    assert_eq!(requested, [0, 3, 6, 9]);
}

#[test]
fn first_request_has_zero_cookie_and_verifier() {
    let mut server = server_with_entries(4);
    server.page_entries = 2;
    let mut rpc = client(&mut server);

    let count = ReadDir::new(&mut rpc, FixtureServer::handle(ROOT_ID)).count();
    assert_eq!(count, 4);
    drop(rpc);

    assert_eq!(server.readdir_requests[0], (0, [0; 8]));
    // later requests echo the verifier of the previous page
    assert_eq!(server.readdir_requests[1], (2, [0xC0, 0x0C, 0, 0, 0, 0, 0, 0]));
}

#[test]
fn changed_verifier_is_followed() {
    let mut server = server_with_entries(6);
    server.page_entries = 2;
    server.rotate_verifier = true;
    let mut rpc = client(&mut server);

    let mut cursor = DirCursor::new(FixtureServer::handle(ROOT_ID));
    let mut seen = 0;
    while let Some(entry) = cursor.next_entry(&mut rpc).expect("entry") {
        seen += 1;
        assert_eq!(cursor.cookie(), entry.cookie);
    }
    assert_eq!(seen, 6);
    assert!(cursor.is_done());
    assert_eq!(cursor.verifier()[7], 2);
    drop(rpc);

    let verifiers: Vec<u8> = server.readdir_requests.iter().map(|(_, v)| v[7]).collect();
    assert_eq!(verifiers, [0, 0, 1]);
}

#[test]
fn empty_directory() {
    let mut server = FixtureServer::sample();
    let mut nfs = NfsMount::with_client(RpcClient::new(&mut server), "/export", MountOptions::default())
        .expect("mount");

    assert_eq!(nfs.read_dir("/empty").expect("read_dir").count(), 0);
    let entries: Vec<String> = nfs
        .read_dir("/boot")
        .expect("read_dir")
        .map(|e| e.expect("entry").name_lossy().into_owned())
        .collect();
    assert_eq!(entries, ["vmlinuz", "initrd"]);
    drop(nfs);

    assert_eq!(server.readdir_requests.len(), 2);
}

#[test]
fn exact_page_multiple_ends_on_eof() {
    let mut server = server_with_entries(6);
    server.page_entries = 3;
    let mut rpc = client(&mut server);

    assert_eq!(ReadDir::new(&mut rpc, FixtureServer::handle(ROOT_ID)).count(), 6);
    drop(rpc);
    assert_eq!(server.readdir_requests.len(), 2);
}

#[test]
fn done_cursor_stays_done() {
    let mut server = server_with_entries(1);
    let mut rpc = client(&mut server);

    let mut cursor = DirCursor::new(FixtureServer::handle(ROOT_ID));
    assert!(cursor.next_entry(&mut rpc).expect("entry").is_some());
    assert!(cursor.next_entry(&mut rpc).expect("end").is_none());
    assert!(cursor.next_entry(&mut rpc).expect("still the end").is_none());
    drop(rpc);
    assert_eq!(server.readdir_requests.len(), 1);
}

#[test]
fn name_length_boundary() {
    let mut server = FixtureServer::new();
    server.add_raw_file(ROOT_ID, &[b'n'; 255], b"");
    server.add_raw_file(ROOT_ID, &[b'n'; 256], b"");
    server.add_file(ROOT_ID, "after", b"");
    let mut rpc = client(&mut server);

    let mut entries = ReadDir::new(&mut rpc, FixtureServer::handle(ROOT_ID));
    let first = entries.next().expect("first").expect("255 bytes is fine");
    assert_eq!(first.name.len(), 255);

    let err = entries.next().expect("second").expect_err("256 bytes is too long");
    assert!(
        matches!(err, Error::Decode(DecodeError::NameTooLong { len: 256 })),
        "unexpected error: {err:?}"
    );
    // the iterator is fused after an error
    assert!(entries.next().is_none());
    assert!(entries.cursor().is_done());
}

#[test]
fn non_utf8_names_are_kept() {
    let mut server = FixtureServer::new();
    server.add_raw_file(ROOT_ID, &[0xFF, b'a'], b"");
    let mut rpc = client(&mut server);

    let entry = ReadDir::new(&mut rpc, FixtureServer::handle(ROOT_ID))
        .next()
        .expect("one entry")
        .expect("entry");
    assert_eq!(entry.name, [0xFF, b'a']);
    assert_eq!(entry.name_lossy(), "\u{FFFD}a");
}

#[test]
fn page_without_progress_is_rejected() {
    let mut server = FixtureServer::new();
    // attributes absent, verifier, no entries, not at EOF
    server.scripted.push_back(Box::new(|xid| reply_with(xid, &words(&[0, 0, 0, 0, 0, 0]))));
    let mut rpc = client(&mut server);

    let mut entries = ReadDir::new(&mut rpc, FixtureServer::handle(ROOT_ID));
    let err = entries.next().expect("an error").expect_err("no progress");
    assert!(matches!(err, Error::ProtocolViolation(_)), "unexpected error: {err:?}");
    assert!(entries.next().is_none());
}

#[test]
fn reply_without_dirlist_is_rejected() {
    let mut server = FixtureServer::new();
    server.scripted.push_back(Box::new(|xid| reply_with(xid, &words(&[0, 0, 1, 2]))));
    let mut rpc = client(&mut server);

    let err = nfsproc3_readdir(&mut rpc, &FixtureServer::handle(ROOT_ID), 0, &[0; 8])
        .expect_err("missing dirlist");
    assert!(matches!(err, Error::ProtocolViolation(_)), "unexpected error: {err:?}");
}

#[test]
fn readdir_page_exposes_attributes_and_verifier() {
    let mut server = server_with_entries(2);
    let mut rpc = client(&mut server);

    let page = nfsproc3_readdir(&mut rpc, &FixtureServer::handle(ROOT_ID), 0, &[0; 8]).expect("page");
    assert!(page.dir_attributes.expect("attributes").is_dir());
    assert_eq!(page.verifier, [0xC0, 0x0C, 0, 0, 0, 0, 0, 0]);
    assert!(!page.is_empty());

    let mut src = page.entries();
    assert!(src.decode_bool().expect("first entry present"));
}

#[test]
fn readdir_on_a_file() {
    let mut server = FixtureServer::new();
    let file = server.add_file(ROOT_ID, "plain", b"data");
    let mut rpc = client(&mut server);

    let mut entries = ReadDir::new(&mut rpc, FixtureServer::handle(file));
    let err = entries.next().expect("an error").expect_err("not a directory");
    assert!(err.is_nfs(nfsstat3::NFS3ERR_NOTDIR), "unexpected error: {err:?}");
}
