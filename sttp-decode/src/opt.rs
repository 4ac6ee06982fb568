use std::path::PathBuf;

use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(about = "A decoder for SSR time-tagged binary archives (TCP/TTDP framing).")]
pub struct Opt {
    #[structopt(short = "h", long = "headers", help = "prepend header lines to TCP and Data outputs")]
    pub headers: bool,

    #[structopt(short = "r", long = "raw", parse(from_os_str), help = "write raw concatenated subpacket bytes")]
    pub raw: Option<PathBuf>,

    #[structopt(short = "x", long = "script", parse(from_os_str), help = "load an embedded script exposing a ParseData function")]
    pub script: Option<PathBuf>,

    #[structopt(short = "t", long = "tcp-dump", parse(from_os_str), help = "write TCP dump")]
    pub tcp_dump: Option<PathBuf>,

    #[structopt(short = "d", long = "data-dump", parse(from_os_str), help = "write Data dump")]
    pub data_dump: Option<PathBuf>,

    #[structopt(short = "m", long = "mixed-dump", parse(from_os_str), help = "write Mixed dump")]
    pub mixed_dump: Option<PathBuf>,

    #[structopt(short = "n", long = "line-dump", parse(from_os_str), help = "write timestamped-line output")]
    pub line_dump: Option<PathBuf>,

    #[structopt(
        short = "N",
        long = "format",
        default_value = "%Y %m %d %H %M %S ",
        help = "override timestamp format"
    )]
    pub format: String,

    #[structopt(short = "S", long = "suppress-msec", help = "suppress trailing milliseconds in timestamps")]
    pub suppress_msec: bool,

    #[structopt(short = "O", long = "offset", help = "include archive byte-offset column in -t, -d, -m")]
    pub offset: bool,

    #[structopt(long = "nointerp", help = "disable TCP interpolation")]
    pub nointerp: bool,

    #[structopt(long = "dat-bpl", help = "one hex byte per line in -d output")]
    pub dat_bpl: bool,

    #[structopt(short = "k", long = "skip", help = "interval gate: skip, e.g. 10 or 10L")]
    pub skip: Option<String>,

    #[structopt(short = "i", long = "interval", help = "interval gate: interval, e.g. 5 or 5L")]
    pub interval: Option<String>,

    #[structopt(short = "w", long = "window", help = "interval gate: window, e.g. 2 or 2L")]
    pub window: Option<String>,

    #[structopt(short = "v", long = "nwins", default_value = "0", help = "interval gate: window count, 0 = unbounded")]
    pub nwins: u32,

    #[structopt(name = "ARCHIVE", parse(from_os_str), help = "time-tagged archive file")]
    pub archive: PathBuf,
}
