//! The modem orchestrator: packet → bitstream → DDS modulator →
//! post-processing → sample sink, with PTT bracketing the transmission, and
//! the symmetric bit-at-a-time receive path driving the streaming decoder.

use crate::config::ModemConfig;
use crate::decoder::BitstreamState;
use crate::encoder::encode_bitstream;
use crate::errors::{DeviceError, Result};
use crate::fx25::encode_fx25_bitstream;
use crate::frame::{encode_frame, Packet};
use crate::modulator::DdsAfskModulator;
use crate::ptt::PttControl;
use crate::sink::SampleSink;

const DRAIN_TIMEOUT_MS: u64 = 10_000;
const PREEMPHASIS_TAU_SECS: f64 = 75e-6;

/// Which bitstream format a [`Modem`] produces on transmit.
#[derive(Debug, Clone, PartialEq)]
pub enum Converter {
    /// Bare AX.25: preamble flags, bit-stuffed frame, postamble flags.
    Ax25,
    /// FX.25: the AX.25 block wrapped in a correlation tag and Reed-Solomon
    /// parity, itself preceded/followed by HDLC flags for the benefit of a
    /// plain-AX.25 receiver riding through the FX.25 envelope.
    Fx25 { min_check_bytes: usize },
}

impl Converter {
    /// Encode `packet` into a ready-to-modulate NRZI bitstream.
    pub fn encode(&self, packet: &Packet, config: &ModemConfig) -> Vec<u8> {
        match self {
            Converter::Ax25 => {
                encode_bitstream(packet, config.preamble_flags(), config.postamble_flags())
            }
            Converter::Fx25 { min_check_bytes } => {
                let frame_bytes =
                    encode_frame(&packet.from, &packet.to, &packet.path, &packet.data);
                encode_fx25_bitstream(
                    &frame_bytes,
                    config.preamble_flags(),
                    config.postamble_flags(),
                    *min_check_bytes,
                )
            }
        }
    }
}

/// Bracket a transmission with a PTT assert/release pair, releasing on
/// every exit path including panics-during-unwind-adjacent early returns;
/// the explicit `release()` call is the normal path, `Drop` is the backstop
/// for anything that returns before reaching it.
struct PttGuard<'a> {
    ptt: Option<&'a mut dyn PttControl>,
    asserted: bool,
}

impl<'a> PttGuard<'a> {
    fn new(ptt: Option<&'a mut dyn PttControl>) -> Self {
        PttGuard {
            ptt,
            asserted: false,
        }
    }

    fn assert(&mut self) -> Result<()> {
        if let Some(p) = self.ptt.as_deref_mut() {
            p.set(true)?;
        }
        self.asserted = true;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.asserted = false;
        match self.ptt.as_deref_mut() {
            Some(p) => p.set(false),
            None => Ok(()),
        }
    }
}

impl Drop for PttGuard<'_> {
    fn drop(&mut self) {
        if self.asserted {
            if let Some(p) = self.ptt.as_deref_mut() {
                if let Err(e) = p.set(false) {
                    log::error!("PTT release-on-drop failed: {e}");
                }
            }
        }
    }
}

/// Single-pole pre-emphasis IIR: `y[n] = x[n] - x[n-1] + alpha*y[n-1]`,
/// seeded with `x_prev = y_prev = x[0]`.
fn apply_preemphasis(samples: &mut [f64], sample_rate: u32) {
    if samples.is_empty() {
        return;
    }
    let alpha = (-1.0 / (sample_rate as f64 * PREEMPHASIS_TAU_SECS)).exp();
    let mut prev_x = samples[0];
    let mut prev_y = samples[0];
    for s in samples.iter_mut() {
        let x = *s;
        let y = x - prev_x + alpha * prev_y;
        *s = y;
        prev_x = x;
        prev_y = y;
    }
}

fn silence_samples(ms: u32, sample_rate: u32) -> usize {
    (ms as u64 * sample_rate as u64 / 1000) as usize
}

fn postprocess(samples: &mut Vec<f64>, config: &ModemConfig, sample_rate: u32) {
    if config.preemphasis {
        apply_preemphasis(samples, sample_rate);
    }
    for s in samples.iter_mut() {
        *s *= config.gain;
    }
    samples.resize(
        samples.len() + silence_samples(config.end_silence_ms, sample_rate),
        0.0,
    );
    let lead = silence_samples(config.begin_silence_ms, sample_rate);
    if lead > 0 {
        samples.splice(0..0, std::iter::repeat(0.0).take(lead));
    }
}

/// The transmit/receive orchestrator. Holds non-owning references to the
/// caller-owned sample sink and PTT controller; the DDS modulator and
/// decoder state are exclusive to this `Modem` since nothing else needs to
/// observe or share them mid-transmission.
pub struct Modem<'a> {
    config: ModemConfig,
    converter: Converter,
    modulator: DdsAfskModulator,
    sink: &'a mut dyn SampleSink,
    ptt: Option<&'a mut dyn PttControl>,
    decoder: BitstreamState,
    callbacks: Vec<Box<dyn FnMut(&Packet) + 'a>>,
}

impl<'a> Modem<'a> {
    pub fn new(config: ModemConfig, converter: Converter, sink: &'a mut dyn SampleSink) -> Self {
        let modulator = DdsAfskModulator::new(
            config.f_mark,
            config.f_space,
            config.baud,
            config.sample_rate,
            config.alpha,
        );
        Modem {
            config,
            converter,
            modulator,
            sink,
            ptt: None,
            decoder: BitstreamState::new(),
            callbacks: Vec::new(),
        }
    }

    pub fn with_ptt(mut self, ptt: &'a mut dyn PttControl) -> Self {
        self.ptt = Some(ptt);
        self
    }

    /// Register a callback invoked with every packet [`receive_bit`]
    /// successfully assembles.
    pub fn on_packet_received(&mut self, callback: impl FnMut(&Packet) + 'a) {
        self.callbacks.push(Box::new(callback));
    }

    /// Encode and transmit one packet: PTT-assert, start the sink, write
    /// every sample, wait for drain, release PTT, stop the sink. PTT is
    /// released on every exit path, including sink errors.
    pub fn transmit(&mut self, packet: &Packet) -> Result<()> {
        let bits = self.converter.encode(packet, &self.config);
        self.transmit_bits(&bits)
    }

    /// As [`transmit`](Self::transmit) but from an already-encoded
    /// bitstream (e.g. one produced by [`Converter::encode`] ahead of
    /// time, or fed in from an external encoder).
    pub fn transmit_bits(&mut self, bits: &[u8]) -> Result<()> {
        let mut samples = Vec::with_capacity(bits.len() * 40);
        for &bit in bits {
            let n = self.modulator.next_samples_per_bit();
            for _ in 0..n {
                samples.push(self.modulator.modulate(bit));
            }
        }
        postprocess(&mut samples, &self.config, self.sink.sample_rate());

        let mut guard = PttGuard::new(self.ptt.as_deref_mut());
        let tx_result = guard.assert().and_then(|_| {
            self.sink.start()?;
            self.sink.write(&samples)?;
            if self.sink.wait_write_completed(DRAIN_TIMEOUT_MS) {
                Ok(())
            } else {
                Err(DeviceError::Timeout.into())
            }
        });

        let release_result = guard.release();
        let stop_result = self.sink.stop();

        tx_result?;
        release_result?;
        stop_result?;

        log::info!(
            "transmitted {} samples for {} bits",
            samples.len(),
            bits.len()
        );
        Ok(())
    }

    /// Feed one already-sliced hard bit into the streaming decoder. Returns
    /// the decoded packet and invokes registered callbacks whenever a frame
    /// boundary closes on a CRC-valid frame.
    pub fn receive_bit(&mut self, bit: u8) -> Option<Packet> {
        let completed = self.decoder.step(bit);
        if !completed {
            return None;
        }
        let frame = self.decoder.frame.take()?;
        let packet: Packet = frame.into();
        for callback in self.callbacks.iter_mut() {
            callback(&packet);
        }
        Some(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullSink;

    fn packet() -> Packet {
        Packet {
            from: "N0CALL-1".parse().unwrap(),
            to: "APRS".parse().unwrap(),
            path: vec!["WIDE1-1".parse().unwrap()],
            data: b"hello".to_vec(),
        }
    }

    #[test]
    fn transmit_envelope_starts_stops_and_writes_once() {
        let mut sink = NullSink::new(48000);
        let config = ModemConfig::default();
        let mut modem = Modem::new(config, Converter::Ax25, &mut sink);
        modem.transmit(&packet()).unwrap();
        assert!(sink.total_written() > 0);
    }

    #[test]
    fn ptt_is_asserted_during_transmit_and_released_after() {
        use crate::ptt::NullPtt;

        let mut sink = NullSink::new(48000);
        let mut ptt = NullPtt::default();
        let config = ModemConfig::default();
        {
            let mut modem = Modem::new(config, Converter::Ax25, &mut sink).with_ptt(&mut ptt);
            modem.transmit(&packet()).unwrap();
        }
        assert!(!ptt.get());
    }

    #[test]
    fn transmit_then_receive_round_trips_through_the_air_interface() {
        let mut sink = NullSink::new(48000);
        let config = ModemConfig::default();
        let p = packet();

        let bits = Converter::Ax25.encode(&p, &config);

        let mut rx = Modem::new(config, Converter::Ax25, &mut sink);
        let mut decoded = None;
        for bit in bits {
            if let Some(packet) = rx.receive_bit(bit) {
                decoded = Some(packet);
            }
        }
        assert_eq!(decoded.unwrap().data, p.data);
    }

    #[test]
    fn fx25_converter_produces_a_longer_bitstream_than_bare_ax25() {
        let config = ModemConfig::default();
        let p = packet();
        let ax25_bits = Converter::Ax25.encode(&p, &config);
        let fx25_bits = Converter::Fx25 { min_check_bytes: 16 }.encode(&p, &config);
        assert!(fx25_bits.len() > ax25_bits.len());
    }

    #[test]
    fn postprocessing_prepends_and_appends_silence() {
        let mut samples = vec![1.0, 1.0, 1.0];
        let config = ModemConfig {
            begin_silence_ms: 10,
            end_silence_ms: 20,
            ..ModemConfig::default()
        };
        postprocess(&mut samples, &config, 1000);
        // 10ms @ 1000Hz = 10 samples lead, 20ms = 20 samples trail.
        assert_eq!(samples.len(), 10 + 3 + 20);
        assert!(samples[..10].iter().all(|&s| s == 0.0));
        assert!(samples[13..].iter().all(|&s| s == 0.0));
    }
}
