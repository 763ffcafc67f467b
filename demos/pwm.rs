//! Sweeps the electrical angle through ten turns at the edge of the linear
//! region and records every modulation scheme to `out.mcap`.

use std::{borrow::Cow, collections::BTreeMap, f32::consts::TAU, fs::File, io::BufWriter, sync::Arc};

use foc_core::{
    math::{Cordic, MathBackend, Software},
    park_clarke::{inverse_park, RotatingReferenceFrame, TwoPhaseStationaryOrthogonalReferenceFrame},
    pwm::{Modulation, Sinusoidal},
    svpwm::{AlternatingReverse, Odtv1Norm, SevenSegment, SvGen},
    FRAC_SQRT_3_2,
};
use serde::Serialize;

const PERIOD_NS: u64 = 1_000_000;
const DURATION_NS: u64 = 10_000_000_000;
const VELOCITY_RAD_PER_SEC: f32 = 1.;

#[derive(Serialize)]
struct Duties {
    alternating_reverse: [f32; 3],
    odtv1_norm: [f32; 3],
    svgen: [f32; 3],
    seven_segment: [f32; 3],
    sinusoidal: [f32; 3],
}

impl Duties {
    fn of(voltage: TwoPhaseStationaryOrthogonalReferenceFrame) -> Self {
        Self {
            alternating_reverse: AlternatingReverse::modulate(voltage),
            odtv1_norm: Odtv1Norm::modulate(voltage),
            svgen: SvGen::modulate(voltage),
            seven_segment: SevenSegment::modulate(voltage),
            sinusoidal: Sinusoidal::modulate(voltage),
        }
    }
}

#[derive(Serialize)]
struct Sample {
    time_ns: u64,
    angle_rad: f32,
    v_alpha: f32,
    v_beta: f32,
    /// Largest difference between the CORDIC and libm sine and cosine.
    cordic_error: f32,
    duties: Duties,
}

impl Sample {
    fn at(time_ns: u64, angle_rad: f32) -> Self {
        let (sin, cos) = Software::sin_cos(angle_rad);
        let (cordic_sin, cordic_cos) = Cordic::sin_cos(angle_rad);

        let voltage = inverse_park(
            cos,
            sin,
            RotatingReferenceFrame {
                d: 0.,
                q: FRAC_SQRT_3_2,
            },
        );

        Self {
            time_ns,
            angle_rad,
            v_alpha: voltage.alpha,
            v_beta: voltage.beta,
            cordic_error: (cordic_sin - sin).abs().max((cordic_cos - cos).abs()),
            duties: Duties::of(voltage),
        }
    }
}

/// A single CBOR encoded channel in an MCAP file.
struct Recording {
    writer: mcap::Writer<'static, BufWriter<File>>,
    channel_id: u16,
    buffer: Vec<u8>,
}

impl Recording {
    fn create(path: &str, topic: &str) -> anyhow::Result<Self> {
        let mut writer = mcap::Writer::new(BufWriter::new(File::create(path)?))?;
        let channel_id = writer.add_channel(&mcap::Channel {
            topic: topic.to_owned(),
            schema: Some(Arc::new(mcap::Schema {
                name: String::new(),
                encoding: String::new(),
                data: Cow::default(),
            })),
            message_encoding: "cbor".to_owned(),
            metadata: BTreeMap::default(),
        })?;

        Ok(Self {
            writer,
            channel_id,
            buffer: Vec::with_capacity(256),
        })
    }

    fn record(&mut self, time_ns: u64, message: &impl Serialize) -> anyhow::Result<()> {
        self.buffer.clear();
        ciborium::into_writer(message, &mut self.buffer)?;

        let header = mcap::records::MessageHeader {
            channel_id: self.channel_id,
            sequence: 0,
            log_time: time_ns,
            publish_time: time_ns,
        };
        self.writer.write_to_known_channel(&header, &self.buffer)?;
        Ok(())
    }

    fn finish(mut self) -> anyhow::Result<()> {
        self.writer.finish()?;
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let mut recording = Recording::create("out.mcap", "modulation")?;

    for time_ns in (0..=DURATION_NS).step_by(PERIOD_NS as usize) {
        let angle_rad = (VELOCITY_RAD_PER_SEC * time_ns as f32 / 1e9) % TAU;
        recording.record(time_ns, &Sample::at(time_ns, angle_rad))?;
    }

    recording.finish()
}
