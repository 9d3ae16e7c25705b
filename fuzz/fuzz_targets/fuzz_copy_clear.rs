#![no_main]

use libfuzzer_sys::fuzz_target;

use linac_core::mem::{clear_slice, copy_slice};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    // First byte picks the destination offset, the rest is the payload.
    let offset = usize::from(data[0] % 16);
    let payload = &data[1..];

    let mut dst = vec![0xC3u8; payload.len() + offset + 8];
    copy_slice(payload, &mut dst[offset..]);
    assert_eq!(&dst[offset..offset + payload.len()], payload);
    assert!(dst[..offset].iter().all(|&b| b == 0xC3));
    assert!(dst[offset + payload.len()..].iter().all(|&b| b == 0xC3));

    clear_slice(&mut dst[offset..offset + payload.len()]);
    assert!(dst[offset..offset + payload.len()].iter().all(|&b| b == 0));
});
