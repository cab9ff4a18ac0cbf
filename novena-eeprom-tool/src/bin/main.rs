use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use linux_embedded_hal::{
    Delay,
    I2cdev,
};
use novena_eeprom::{
    Eeprom,
    Features,
    I2cTransport,
    Modesetting,
};
use novena_eeprom_tool::edit::{
    parse_features,
    parse_int,
    parse_oops,
};
use novena_eeprom_tool::{
    mac,
    modeline,
    report,
    Edits,
    Invocation,
};

#[derive(Parser)]
#[command(name = "novena-eeprom")]
#[command(about = "Read and program the Novena configuration EEPROM")]
#[command(
    long_about = "If no arguments are specified, the current EEPROM contents are read and \
                  printed.\n\nSpecify -w to write a new EEPROM value. Unspecified fields keep \
                  their current value, or the defaults on a blank EEPROM."
)]
#[command(after_help = report::flag_help())]
struct Cli {
    /// MAC address for the Gigabit Ethernet, e.g. 00:1f:11:02:03:04
    #[arg(short = 'm', value_name = "MAC", value_parser = mac::parse)]
    mac: Option<[u8; 6]>,

    /// Serial number of the board
    #[arg(short = 's', value_name = "SERIAL", value_parser = parse_int::<u32>)]
    serial: Option<u32>,

    /// Comma-delimited list of features present
    #[arg(short = 'f', value_name = "FEATURES", value_parser = parse_features)]
    features: Option<Features>,

    /// EEPROM Oops start and size, e.g. 4096,61440
    #[arg(short = 'o', value_name = "OFFSET[,LENGTH]", value_parser = parse_oops)]
    oops: Option<(u32, Option<u32>)>,

    /// EEPROM page size
    #[arg(short = 'p', value_name = "BYTES", value_parser = parse_int::<u8>)]
    page_size: Option<u8>,

    /// EEPROM total size
    #[arg(short = 'l', value_name = "BYTES", value_parser = parse_int::<u32>)]
    total_size: Option<u32>,

    /// LVDS channel 1 modeline
    #[arg(short = '1', value_name = "MODELINE", value_parser = modeline::parse)]
    lvds1: Option<Modesetting>,

    /// LVDS channel 2 modeline
    #[arg(short = '2', value_name = "MODELINE", value_parser = modeline::parse)]
    lvds2: Option<Modesetting>,

    /// HDMI modeline
    #[arg(short = 'd', value_name = "MODELINE", value_parser = modeline::parse)]
    hdmi: Option<Modesetting>,

    /// Actually write the value to the EEPROM
    #[arg(short = 'w')]
    write: bool,

    /// Export the EEPROM to a file and exit
    #[arg(short = 'e', value_name = "FILE")]
    export: Option<PathBuf>,

    /// Import the EEPROM from a file
    #[arg(short = 'i', value_name = "FILE")]
    import: Option<PathBuf>,

    /// I2C bus device the EEPROM sits on
    #[arg(long, env = "NOVENA_EEPROM_BUS", default_value = "/dev/i2c-2")]
    bus: PathBuf,

    /// 7-bit bus address of the EEPROM
    #[arg(long, value_parser = parse_int::<u8>, default_value = "0x56")]
    address: u8,
}

impl Cli {
    fn invocation(&self) -> Invocation {
        Invocation {
            edits: Edits {
                mac: self.mac,
                serial: self.serial,
                features: self.features,
                eepromoops_offset: self.oops.map(|(offset, _)| offset),
                eepromoops_length: self.oops.and_then(|(_, length)| length),
                page_size: self.page_size,
                eeprom_size: self.total_size,
                lvds1: self.lvds1,
                lvds2: self.lvds2,
                hdmi: self.hdmi,
            },
            write: self.write,
            import: self.import.clone(),
            export: self.export.clone(),
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let bus = I2cdev::new(&cli.bus)
        .map_err(|e| format!("unable to open {}: {e}", cli.bus.display()))?;
    log::debug!("opened {} at address {:#04x}", cli.bus.display(), cli.address);

    let mut eeprom = Eeprom::new(I2cTransport::with_address(bus, cli.address), Delay);
    novena_eeprom_tool::run(&mut eeprom, &cli.invocation(), &mut io::stdout().lock())?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
