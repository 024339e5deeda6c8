mod receive;
mod transmit;
