#![no_std]
#![no_main]

// https://dev.to/theembeddedrustacean/embedded-rust-embassy-gpio-button-controlled-blinking-3ee6
// https://www.youtube.com/watch?v=dab_vzVDr_M

use core::fmt::Write;

use despi_m02_trafficlight::io::{Clock, PwmTone, RagOutputs};
use despi_m02_trafficlight::trafficlight::timing::{Millis, TIMING, TONE_FREQUENCY_HZ};
use despi_m02_trafficlight::{Controller, DriverFault, Event};
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Level, Output, OutputType, Speed};
use embassy_stm32::mode::Async;
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::usart::{Config, Uart};
use embassy_stm32::{bind_interrupts, peripherals, usart};
use embassy_sync::{
    blocking_mutex::raw::ThreadModeRawMutex,
    channel::{Channel, Receiver},
};
use embassy_time::{Instant, Timer};
use heapless::String;
use panic_halt as _;

const CHANNEL_CAPACITY: usize = 8;
const LINE_CAPACITY: usize = 96;

enum Report {
    Event(Event),
    Fault(DriverFault),
}

// Diagnostics are best-effort: when the channel is full, reports are dropped
// rather than holding up the controller.
static REPORTS: Channel<ThreadModeRawMutex, Report, CHANNEL_CAPACITY> = Channel::new();

struct Uptime;

impl Clock for Uptime {
    fn now(&self) -> Millis {
        // Truncation is fine, the controller copes with the counter wrapping.
        Millis(Instant::now().as_millis() as u32)
    }
}

#[embassy_executor::task]
async fn report_task(
    mut usart: Uart<'static, Async>,
    reports: Receiver<'static, ThreadModeRawMutex, Report, CHANNEL_CAPACITY>,
) -> ! {
    loop {
        let mut line: String<LINE_CAPACITY> = String::new();
        // A line too long for the buffer is sent truncated.
        let _ = match reports.receive().await {
            Report::Event(event) => write!(line, "{event}\n"),
            Report::Fault(fault) => write!(line, "FAULT: {fault}, holding RED\n"),
        };
        let _ = usart.write(line.as_bytes()).await;
    }
}

async fn halt(fault: DriverFault) -> ! {
    let _ = REPORTS.try_send(Report::Fault(fault));
    loop {
        Timer::after_secs(1).await;
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let peripherals = embassy_stm32::init(Default::default());

    bind_interrupts!(struct Irqs {
        USART1 => usart::InterruptHandler<peripherals::USART1>;
    });
    let mut usart = Uart::new(
        peripherals.USART1,
        peripherals.PA10,
        peripherals.PA9,
        Irqs,
        peripherals.DMA1_CH4,
        peripherals.DMA1_CH5,
        Config::default(), // 115200 baud
    )
    .unwrap();

    let _ = usart
        .write(b"Automated Traffic Light System (Blind-Friendly with Audio Cues)\n")
        .await;

    let lights = RagOutputs::new(
        Output::new(peripherals.PB10, Level::Low, Speed::Low),
        Output::new(peripherals.PB12, Level::Low, Speed::Low),
        Output::new(peripherals.PB14, Level::Low, Speed::Low),
    );

    let buzzer_pin = PwmPin::new_ch1(peripherals.PA6, OutputType::PushPull);
    let pwm = SimplePwm::new(
        peripherals.TIM3,
        Some(buzzer_pin),
        None,
        None,
        None,
        Hertz(TONE_FREQUENCY_HZ),
        CountingMode::EdgeAlignedUp,
    );
    let mut buzzer = pwm.split().ch1;
    buzzer.enable();
    let tone = PwmTone::new(buzzer).unwrap();

    spawner
        .spawn(report_task(usart, REPORTS.receiver()))
        .unwrap();

    let clock = Uptime;
    let mut controller = Controller::new(TIMING, lights, tone);
    let mut context = match controller.start(&clock) {
        Ok(context) => context,
        Err(fault) => halt(fault).await,
    };

    loop {
        match controller.poll(&mut context, &clock) {
            Ok(events) => {
                for event in events {
                    let _ = REPORTS.try_send(Report::Event(event));
                }
            }
            Err(fault) => halt(fault).await,
        }

        Timer::after_millis(TIMING.poll_interval().into()).await;
    }
}
