use std::collections::HashMap;

use motor_link::{BlinkUsb, ControlTransport, DeviceError, EncoderUsb};
use rand::Rng;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Call {
    request_type: u8,
    request: u8,
    value: u16,
    index: u16,
    length: usize,
}

/// 模拟驱动板：记录每次控制传输，SET 请求写入的值由对应 GET 请求读回。
#[derive(Default)]
struct SimulatedBoard {
    calls: Vec<Call>,
    /// SET 请求码 -> GET 请求码
    echo: HashMap<u8, u8>,
    registers: HashMap<u8, Vec<u8>>,
    fail_next: Option<rusb::Error>,
}

impl SimulatedBoard {
    fn blink() -> Self {
        Self {
            echo: HashMap::from([(1, 2)]),
            ..Default::default()
        }
    }

    fn encoder() -> Self {
        Self {
            echo: HashMap::from([(4, 6), (5, 7)]),
            ..Default::default()
        }
    }

    fn with_reply(mut self, request: u8, bytes: &[u8]) -> Self {
        self.registers.insert(request, bytes.to_vec());
        self
    }
}

impl ControlTransport for SimulatedBoard {
    fn write_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> rusb::Result<usize> {
        self.calls.push(Call {
            request_type,
            request,
            value,
            index,
            length: data.len(),
        });
        if let Some(e) = self.fail_next.take() {
            return Err(e);
        }
        if let Some(get) = self.echo.get(&request) {
            self.registers.insert(*get, value.to_le_bytes().to_vec());
        }
        Ok(data.len())
    }

    fn read_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> rusb::Result<usize> {
        self.calls.push(Call {
            request_type,
            request,
            value,
            index,
            length: buf.len(),
        });
        if let Some(e) = self.fail_next.take() {
            return Err(e);
        }
        let reply = self.registers.get(&request).ok_or(rusb::Error::Pipe)?;
        let n = reply.len().min(buf.len());
        buf[..n].copy_from_slice(&reply[..n]);
        Ok(n)
    }
}

fn out_call(request: u8, value: u16) -> Call {
    Call {
        request_type: 0x40,
        request,
        value,
        index: 0,
        length: 0,
    }
}

fn in_call(request: u8, length: usize) -> Call {
    Call {
        request_type: 0xC0,
        request,
        value: 0,
        index: 0,
        length,
    }
}

#[test]
fn set_then_get_duty_forward() {
    let mut board = EncoderUsb::from_transport(SimulatedBoard::encoder());
    board.set_duty_f(1000).unwrap();
    assert_eq!(board.transport().unwrap().calls, vec![out_call(4, 1000)]);

    board.transport_mut().unwrap().registers.insert(6, vec![0xE8, 0x03]);
    assert_eq!(board.get_duty_f().unwrap(), 1000);
    assert_eq!(board.transport().unwrap().calls[1], in_call(6, 2));
}

#[test]
fn angle_speed_is_returned_unmodified() {
    let bytes = [0x78, 0x56, 0x34, 0x12];
    let mut board = EncoderUsb::from_transport(SimulatedBoard::encoder().with_reply(9, &bytes));
    let reading = board.get_angle_speed().unwrap();
    assert_eq!(reading.as_bytes(), &bytes);
    assert_eq!(board.transport().unwrap().calls, vec![in_call(9, 4)]);
}

#[test]
fn angle_and_current_are_raw_two_byte_reads() {
    let mut board = EncoderUsb::from_transport(
        SimulatedBoard::encoder()
            .with_reply(8, &[0xFF, 0x3F])
            .with_reply(10, &[0x10, 0x02]),
    );
    assert_eq!(board.get_angle().unwrap().into_bytes(), vec![0xFF, 0x3F]);
    assert_eq!(board.get_current().unwrap().as_bytes(), &[0x10u8, 0x02]);
    assert_eq!(
        board.transport().unwrap().calls,
        vec![in_call(8, 2), in_call(10, 2)]
    );
}

#[test]
fn toggles_are_single_zero_length_out_transfers() {
    let mut board = EncoderUsb::from_transport(SimulatedBoard::encoder());
    board.toggle_led1().unwrap();
    board.toggle_led2().unwrap();
    board.toggle_led3().unwrap();
    assert_eq!(
        board.transport().unwrap().calls,
        vec![out_call(1, 0), out_call(2, 0), out_call(3, 0)]
    );

    let mut blink = BlinkUsb::from_transport(SimulatedBoard::blink());
    blink.toggle_led1().unwrap();
    assert_eq!(blink.transport().unwrap().calls, vec![out_call(0, 0)]);
}

#[test]
fn reverse_channel_uses_its_own_codes() {
    let mut board = EncoderUsb::from_transport(SimulatedBoard::encoder());
    board.set_duty_r(42u8).unwrap();
    board.set_duty_f(7).unwrap();
    assert_eq!(board.get_duty_r().unwrap(), 42);
    assert_eq!(board.get_duty_f().unwrap(), 7);
    assert_eq!(
        board.transport().unwrap().calls,
        vec![out_call(5, 42), out_call(4, 7), in_call(7, 2), in_call(6, 2)]
    );
}

#[test]
fn blink_round_trip_all_duty_values() {
    let mut board = BlinkUsb::from_transport(SimulatedBoard::blink());
    for d in 0..=u16::MAX {
        board.set_duty(d).unwrap();
        assert_eq!(board.get_duty().unwrap(), d);
        board.transport_mut().unwrap().calls.clear();
    }
}

#[test]
fn encoder_round_trip_random_duty_values() {
    let mut rng = rand::thread_rng();
    let mut board = EncoderUsb::from_transport(SimulatedBoard::encoder());
    for _ in 0..500 {
        let forward: u16 = rng.gen();
        let reverse: u16 = rng.gen_range(0..=u16::MAX);
        board.set_duty_f(forward).unwrap();
        board.set_duty_r(reverse).unwrap();
        assert_eq!(board.get_duty_f().unwrap(), forward);
        assert_eq!(board.get_duty_r().unwrap(), reverse);
    }
}

#[test]
fn fractional_and_string_duties_are_coerced() {
    let mut board = BlinkUsb::from_transport(SimulatedBoard::blink());
    board.set_duty(512.9f64).unwrap();
    board.set_duty("2048").unwrap();
    assert_eq!(
        board.transport().unwrap().calls,
        vec![out_call(1, 512), out_call(1, 2048)]
    );
}

#[test]
fn conversion_error_issues_no_transfer() {
    let mut board = EncoderUsb::from_transport(SimulatedBoard::encoder());
    assert!(matches!(board.set_duty_f("full"), Err(DeviceError::Conversion(_))));
    assert!(matches!(board.set_duty_r(-5), Err(DeviceError::Conversion(_))));
    assert!(matches!(board.set_duty_f(70_000), Err(DeviceError::Conversion(_))));
    assert!(board.transport().unwrap().calls.is_empty());
}

#[test]
fn transfer_failure_is_reported_and_recoverable() {
    let mut board = EncoderUsb::from_transport(SimulatedBoard::encoder());
    board.transport_mut().unwrap().fail_next = Some(rusb::Error::Timeout);

    match board.set_duty_f(300) {
        Err(DeviceError::TransferFailed { operation, source }) => {
            assert_eq!(operation, "SET_DUTY_F");
            assert_eq!(source, rusb::Error::Timeout);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(board.is_open());

    board.set_duty_f(300).unwrap();
    assert_eq!(board.get_duty_f().unwrap(), 300);
}

#[test]
fn failed_read_produces_no_value() {
    let mut board = EncoderUsb::from_transport(SimulatedBoard::encoder().with_reply(6, &[0, 0]));
    board.transport_mut().unwrap().fail_next = Some(rusb::Error::Io);
    let err = board.get_duty_f().unwrap_err();
    assert_eq!(err.operation(), Some("GET_DUTY_F"));
    // 失败和读到 0 可以区分
    assert_eq!(board.get_duty_f().unwrap(), 0);
}

#[test]
fn short_reply_is_a_length_mismatch() {
    let mut board = EncoderUsb::from_transport(
        SimulatedBoard::encoder()
            .with_reply(9, &[1, 2])
            .with_reply(7, &[5]),
    );
    assert!(matches!(
        board.get_angle_speed(),
        Err(DeviceError::LengthMismatch {
            operation: "GET_ANGLE_SPEED",
            expected: 4,
            actual: 2
        })
    ));
    assert!(matches!(
        board.get_duty_r(),
        Err(DeviceError::LengthMismatch {
            operation: "GET_DUTY_R",
            expected: 2,
            actual: 1
        })
    ));
}

#[test]
fn closed_client_rejects_every_operation() {
    let mut board = EncoderUsb::from_transport(SimulatedBoard::encoder());
    board.close();
    assert!(!board.is_open());
    assert!(board.transport().is_none());
    assert!(matches!(board.toggle_led2(), Err(DeviceError::ClosedHandle)));
    assert!(matches!(board.set_duty_r(1), Err(DeviceError::ClosedHandle)));
    assert!(matches!(board.get_duty_f(), Err(DeviceError::ClosedHandle)));
    assert!(matches!(board.get_current(), Err(DeviceError::ClosedHandle)));

    let mut blink = BlinkUsb::from_transport(SimulatedBoard::blink());
    blink.close();
    assert!(matches!(blink.get_duty(), Err(DeviceError::ClosedHandle)));
}
