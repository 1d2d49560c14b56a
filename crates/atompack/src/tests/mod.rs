mod boundary;
mod laws;
mod scenarios;
